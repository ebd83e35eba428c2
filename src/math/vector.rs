use super::{Vector2, TOLERANCE};

/// Planar operations missing from `nalgebra`'s 2D vectors.
///
/// Addition, subtraction, scaling, dot products and normalisation come from
/// `nalgebra` directly. The scalar cross product is positive when `other`
/// lies counter-clockwise of `self`; every orientation test in the crate
/// uses it.
pub trait Vector2Ext {
    /// Scalar (z component of the) cross product.
    fn wedge(&self, other: &Vector2) -> f64;

    /// The vector rotated a quarter turn counter-clockwise.
    fn quarter_turn(&self) -> Vector2;

    /// The vector rotated by `angle` radians counter-clockwise.
    fn rotate_by(&self, angle: f64) -> Vector2;

    /// The unit vector in the same direction, or `None` for a (near) zero vector.
    fn normalized_checked(&self) -> Option<Vector2>;
}

impl Vector2Ext for Vector2 {
    fn wedge(&self, other: &Vector2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn quarter_turn(&self) -> Vector2 {
        Vector2::new(-self.y, self.x)
    }

    fn rotate_by(&self, angle: f64) -> Vector2 {
        let (sin, cos) = angle.sin_cos();
        Vector2::new(cos * self.x - sin * self.y, sin * self.x + cos * self.y)
    }

    fn normalized_checked(&self) -> Option<Vector2> {
        self.try_normalize(TOLERANCE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn wedge_sign_is_counter_clockwise_positive() {
        let x = Vector2::new(1.0, 0.0);
        let y = Vector2::new(0.0, 1.0);
        assert!(x.wedge(&y) > 0.0);
        assert!(y.wedge(&x) < 0.0);
        assert_abs_diff_eq!(x.wedge(&x), 0.0);
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        let v = Vector2::new(3.0, 4.0);
        assert_abs_diff_eq!(v.quarter_turn(), Vector2::new(-4.0, 3.0));
        assert_abs_diff_eq!(v.quarter_turn(), v.rotate_by(FRAC_PI_2), epsilon = 1e-12);
    }

    #[test]
    fn rotate_preserves_length() {
        let v = Vector2::new(2.0, -1.0);
        let r = v.rotate_by(1.234);
        assert_abs_diff_eq!(r.norm(), v.norm(), epsilon = 1e-12);
    }

    #[test]
    fn normalize_zero_vector() {
        assert!(Vector2::zeros().normalized_checked().is_none());
        let n = Vector2::new(0.0, 5.0).normalized_checked().unwrap();
        assert_abs_diff_eq!(n, Vector2::new(0.0, 1.0));
    }
}
