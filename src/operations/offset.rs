use crate::error::{OperationError, Result};
use crate::geometry::Line;
use crate::math::TOLERANCE;
use crate::skeleton::{Options, Wavefront};

/// Offsets rings and chains by a signed distance.
///
/// Positive distances move left of each line: inward for counter-clockwise
/// rings, outward for clockwise holes. Negative distances move right.
#[derive(Debug, Clone)]
pub struct Offset {
    lines: Vec<Line>,
    distance: f64,
    options: Options,
}

impl Offset {
    /// Creates a new offset operation.
    #[must_use]
    pub fn new(lines: Vec<Line>, distance: f64) -> Self {
        Self {
            lines,
            distance,
            options: Options::default(),
        }
    }

    /// Sets the reflex corner rounding angle in degrees; `None` mitres.
    #[must_use]
    pub fn rounding_angle(mut self, degrees: Option<f64>) -> Self {
        self.options.rounding_angle = degrees;
        self
    }

    /// Sets the chamfer cutoff angle in degrees.
    #[must_use]
    pub fn cutoff_angle(mut self, degrees: Option<f64>) -> Self {
        self.options.cutoff_angle = degrees;
        self
    }

    /// Enables or disables splitting of the front.
    #[must_use]
    pub fn splits(mut self, splits: bool) -> Self {
        self.options.splits = splits;
        self
    }

    /// Executes the offset.
    ///
    /// A zero distance returns the sanitised input unchanged.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOption` for a non-finite distance or
    /// invalid angles, and `GeometryError::NonFinite` for non-finite input.
    pub fn execute(&self) -> Result<Vec<Line>> {
        if !self.distance.is_finite() {
            return Err(OperationError::InvalidOption {
                option: "distance",
                value: self.distance,
            }
            .into());
        }
        let wavefront = Wavefront::new(self.lines.iter().cloned())?;
        if self.distance.abs() < TOLERANCE {
            return Ok(wavefront.lines().to_vec());
        }
        let options = self.options.clone().with_limit(self.distance);
        Ok(wavefront.progress(&options, |_, _| {})?.readout())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::rotate_to_canonical_start;
    use crate::math::Point2;
    use approx::assert_abs_diff_eq;

    fn square() -> Line {
        Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    fn l_shape() -> Line {
        Line::ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 5.0),
            (5.0, 5.0),
            (5.0, 10.0),
            (0.0, 10.0),
        ])
    }

    #[test]
    fn zero_distance_is_identity() {
        let result = Offset::new(vec![square()], 0.0).execute().unwrap();
        assert_eq!(result, vec![square()]);
    }

    #[test]
    fn rejects_non_finite_distance() {
        assert!(Offset::new(vec![square()], f64::INFINITY).execute().is_err());
    }

    #[test]
    fn inset_square() {
        let result = Offset::new(vec![square()], 2.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        assert_abs_diff_eq!(result[0].signed_area(), 36.0, epsilon = 1e-9);
    }

    #[test]
    fn hole_grows_under_inset() {
        let hole = square().reversed();
        let result = Offset::new(vec![hole], 1.0)
            .rounding_angle(None)
            .execute()
            .unwrap();
        assert_eq!(result.len(), 1);
        // Still clockwise, now 12 wide.
        assert_abs_diff_eq!(result[0].signed_area(), -144.0, epsilon = 1e-9);
    }

    #[test]
    fn l_shape_inset_rounds_reflex_corner() {
        let result = Offset::new(vec![l_shape()], 1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].points.len() > 6);
        for p in &result[0].points {
            assert!(p.x > 1.0 - 1e-9 && p.x < 9.0 + 1e-9);
            assert!(p.y > 1.0 - 1e-9 && p.y < 9.0 + 1e-9);
            // Nothing comes closer than the offset to the reflex corner.
            assert!((p - Point2::new(5.0, 5.0)).norm() > 1.0 - 1e-9);
        }
    }

    #[test]
    fn mitred_l_shape_inset() {
        let result = Offset::new(vec![l_shape()], 1.0)
            .rounding_angle(None)
            .execute()
            .unwrap();
        assert_eq!(result.len(), 1);
        let points = rotate_to_canonical_start(&result[0].points);
        let expected = [(1.0, 1.0), (9.0, 1.0), (9.0, 4.0), (4.0, 4.0), (4.0, 9.0), (1.0, 9.0)];
        assert_eq!(points.len(), expected.len());
        for (p, &(x, y)) in points.iter().zip(&expected) {
            assert_abs_diff_eq!(*p, Point2::new(x, y), epsilon = 1e-9);
        }
    }

    #[test]
    fn notch_splits_into_two_rings() {
        let notch = Line::ring(&[
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 10.0),
            (11.0, 10.0),
            (10.0, 2.0),
            (9.0, 10.0),
            (0.0, 10.0),
        ]);
        let result = Offset::new(vec![notch], 1.5).execute().unwrap();
        assert_eq!(result.len(), 2);
        for ring in &result {
            assert!(ring.closed);
            assert!(ring.signed_area() > 0.0);
        }
        let (left, right): (Vec<&Line>, Vec<&Line>) = result
            .iter()
            .partition(|ring| ring.points.iter().all(|p| p.x < 10.0));
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn outset_then_inset_restores_convex_ring() {
        let grown = Offset::new(vec![square()], -2.0).execute().unwrap();
        let restored = Offset::new(grown, 2.0).splits(false).execute().unwrap();
        assert_eq!(restored.len(), 1);
        let points = rotate_to_canonical_start(&restored[0].points);
        let expected = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert_eq!(points.len(), expected.len(), "got {points:?}");
        for (p, &(x, y)) in points.iter().zip(&expected) {
            assert_abs_diff_eq!(*p, Point2::new(x, y), epsilon = 1e-6);
        }
    }

    #[test]
    fn disjoint_rings_offset_independently() {
        let far = Line::ring(&[(20.0, 0.0), (30.0, 0.0), (30.0, 10.0), (20.0, 10.0)]);
        let result = Offset::new(vec![square(), far], 2.0).execute().unwrap();
        assert_eq!(result.len(), 2);
        for ring in &result {
            assert_abs_diff_eq!(ring.signed_area(), 36.0, epsilon = 1e-9);
        }
    }
}
