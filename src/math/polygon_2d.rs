use super::{Point2, Vector2, Vector2Ext, TOLERANCE};

/// Signed area enclosed by a ring of points, closing edge implied.
///
/// Positive for counter-clockwise rings, negative for clockwise ones and zero
/// for anything with fewer than three points.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.coords.wedge(&b.coords))
        .sum();
    twice * 0.5
}

/// Rotates a ring so it starts at its lowest-leftmost point.
///
/// Engine output starts wherever the walk happened to begin; tests compare
/// rings after this rotation.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    let lower_left = |a: &Point2, b: &Point2| {
        if (a.x - b.x).abs() < TOLERANCE {
            a.y < b.y - TOLERANCE
        } else {
            a.x < b.x
        }
    };
    let start = (1..points.len()).fold(0, |best, i| {
        if lower_left(&points[i], &points[best]) {
            i
        } else {
            best
        }
    });
    let mut rotated = points.to_vec();
    rotated.rotate_left(start);
    rotated
}

/// Unit normal pointing left of an edge direction, the side the front moves
/// towards.
#[must_use]
pub fn left_normal(direction: Vector2) -> Vector2 {
    direction.quarter_turn()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn l_shape() -> Vec<Point2> {
        [(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (5.0, 5.0), (5.0, 10.0), (0.0, 10.0)]
            .iter()
            .map(|&(x, y)| Point2::new(x, y))
            .collect()
    }

    #[test]
    fn area_sign_follows_orientation() {
        let mut ring = l_shape();
        assert_abs_diff_eq!(signed_area(&ring), 75.0, epsilon = TOLERANCE);
        ring.reverse();
        assert_abs_diff_eq!(signed_area(&ring), -75.0, epsilon = TOLERANCE);
    }

    #[test]
    fn area_of_too_few_points_is_zero() {
        assert!(signed_area(&l_shape()[..2]).abs() < TOLERANCE);
        assert!(signed_area(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn canonical_start_is_lower_left() {
        let mut ring = l_shape();
        ring.rotate_left(3);
        let rotated = rotate_to_canonical_start(&ring);
        assert_eq!(rotated, l_shape());
        assert!(rotate_to_canonical_start(&[]).is_empty());
    }

    #[test]
    fn left_normal_of_eastward_edge_points_north() {
        let n = left_normal(Vector2::new(2.0, 0.0).normalize());
        assert_abs_diff_eq!(n, Vector2::new(0.0, 1.0), epsilon = TOLERANCE);
    }
}
