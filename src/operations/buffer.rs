use crate::error::{OperationError, Result};
use crate::geometry::Line;
use crate::math::TOLERANCE;
use crate::skeleton::{Options, Wavefront};

/// Grows rings and chains into buffer polygons.
///
/// Chains are buffered on both sides with round caps and come out as
/// counter-clockwise rings. Rings keep their orientation: outer rings grow
/// for a positive margin and shrink for a negative one, while holes do the
/// opposite. Chains have no interior and disappear under a negative margin.
///
/// With an overshoot the geometry is first buffered by `margin + overshoot`
/// and then pulled back by `overshoot` without splitting, which closes gaps
/// narrower than twice the overshoot.
#[derive(Debug, Clone)]
pub struct Buffer {
    lines: Vec<Line>,
    margin: f64,
    overshoot: f64,
    options: Options,
}

impl Buffer {
    /// Creates a new buffer operation.
    #[must_use]
    pub fn new(lines: Vec<Line>, margin: f64) -> Self {
        Self {
            lines,
            margin,
            overshoot: 0.0,
            options: Options::default(),
        }
    }

    /// Sets the overshoot distance.
    #[must_use]
    pub fn overshoot(mut self, overshoot: f64) -> Self {
        self.overshoot = overshoot;
        self
    }

    /// Sets the reflex corner rounding angle in degrees.
    #[must_use]
    pub fn rounding_angle(mut self, degrees: Option<f64>) -> Self {
        self.options.rounding_angle = degrees;
        self
    }

    /// Executes the buffer.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOption` for a non-finite margin or a
    /// negative overshoot, and `GeometryError::NonFinite` for non-finite
    /// input.
    pub fn execute(&self) -> Result<Vec<Line>> {
        if !self.margin.is_finite() {
            return Err(OperationError::InvalidOption {
                option: "margin",
                value: self.margin,
            }
            .into());
        }
        if !(self.overshoot.is_finite() && self.overshoot >= 0.0) {
            return Err(OperationError::InvalidOption {
                option: "overshoot",
                value: self.overshoot,
            }
            .into());
        }

        let wavefront = Wavefront::new(self.lines.iter().cloned())?;
        if self.margin.abs() < TOLERANCE {
            return Ok(wavefront.lines().to_vec());
        }

        let rings: Vec<Line> = wavefront
            .lines()
            .iter()
            .filter(|line| line.closed || self.margin > 0.0)
            .map(Line::to_degenerate_ring)
            .collect();
        let overshoot = self.overshoot.copysign(self.margin);
        // A chain's out-and-back ring grows clockwise when moving left; the
        // negative travel runs it reversed, so it reads out counter-clockwise.
        let grown = self.pass(rings, -(self.margin + overshoot), true)?;
        if self.overshoot > TOLERANCE {
            self.pass(grown, overshoot, false)
        } else {
            Ok(grown)
        }
    }

    fn pass(&self, lines: Vec<Line>, travel: f64, splits: bool) -> Result<Vec<Line>> {
        let options = self.options.clone().with_limit(travel).with_splits(splits);
        Ok(Wavefront::new(lines)?.progress(&options, |_, _| {})?.readout())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point2, Vector2};
    use approx::assert_abs_diff_eq;

    fn distance_to_segment(p: &Point2, a: &Point2, b: &Point2) -> f64 {
        let ab: Vector2 = b - a;
        let t = ((p - a).dot(&ab) / ab.norm_squared()).clamp(0.0, 1.0);
        (p - (a + ab * t)).norm()
    }

    fn segments_cross(a: &Point2, b: &Point2, c: &Point2, d: &Point2) -> bool {
        let orient = |p: &Point2, q: &Point2, r: &Point2| (q - p).perp(&(r - p));
        let (d1, d2) = (orient(a, b, c), orient(a, b, d));
        let (d3, d4) = (orient(c, d, a), orient(c, d, b));
        d1 * d2 < 0.0 && d3 * d4 < 0.0
    }

    #[test]
    fn chain_buffer_is_a_single_round_ring() {
        let chain = Line::chain(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let result = Buffer::new(vec![chain.clone()], 1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        let ring = &result[0];
        assert!(ring.closed);
        assert!(ring.signed_area() > 0.0);

        let upper = 1.0 / (7.5_f64).to_radians().cos() + 1e-9;
        for p in &ring.points {
            let distance = chain
                .points
                .windows(2)
                .map(|s| distance_to_segment(p, &s[0], &s[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(distance > 1.0 - 1e-9 && distance < upper, "{p:?} at {distance}");
        }

        let n = ring.points.len();
        for i in 0..n {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                assert!(!segments_cross(
                    &ring.points[i],
                    &ring.points[(i + 1) % n],
                    &ring.points[j],
                    &ring.points[(j + 1) % n],
                ));
            }
        }
    }

    #[test]
    fn ring_buffer_grows_with_round_corners() {
        let square = Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let result = Buffer::new(vec![square.clone()], 1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        // Sides plus four corner fans circumscribing quarter circles.
        let corners = 24.0 * (7.5_f64).to_radians().tan();
        assert_abs_diff_eq!(result[0].signed_area(), 140.0 + corners, epsilon = 1e-6);

        let overshot = Buffer::new(vec![square], 1.0)
            .overshoot(0.5)
            .execute()
            .unwrap();
        assert_eq!(overshot.len(), 1);
        assert!((overshot[0].signed_area() - 140.0 - corners).abs() < 0.1);
    }

    #[test]
    fn overshoot_bridges_narrow_gaps() {
        let a = Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let b = Line::ring(&[(10.5, -5.0), (20.0, -5.0), (20.0, 15.0), (10.5, 15.0)]);
        let apart = Buffer::new(vec![a.clone(), b.clone()], 0.1).execute().unwrap();
        assert_eq!(apart.len(), 2);
        let bridged = Buffer::new(vec![a, b], 0.1).overshoot(0.5).execute().unwrap();
        assert_eq!(bridged.len(), 1);
    }

    #[test]
    fn negative_margin_drops_chains() {
        let chain = Line::chain(&[(0.0, 0.0), (10.0, 0.0)]);
        let square = Line::ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let result = Buffer::new(vec![chain, square], -1.0).execute().unwrap();
        assert_eq!(result.len(), 1);
        assert_abs_diff_eq!(result[0].signed_area(), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_negative_overshoot() {
        let chain = Line::chain(&[(0.0, 0.0), (10.0, 0.0)]);
        assert!(Buffer::new(vec![chain], 1.0).overshoot(-1.0).execute().is_err());
    }

    #[test]
    fn holes_stay_clockwise() {
        let outer = Line::ring(&[(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)]);
        let hole = Line::ring(&[(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)]);
        let mut areas: Vec<f64> = Buffer::new(vec![outer, hole], 1.0)
            .rounding_angle(None)
            .execute()
            .unwrap()
            .iter()
            .map(Line::signed_area)
            .collect();
        areas.sort_by(f64::total_cmp);
        assert_eq!(areas.len(), 2);
        assert_abs_diff_eq!(areas[0], -64.0, epsilon = 1e-9);
        assert_abs_diff_eq!(areas[1], 1024.0, epsilon = 1e-9);
    }
}
