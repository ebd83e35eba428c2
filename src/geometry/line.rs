use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::signed_area;
use crate::math::{Point2, TOLERANCE};

/// A point sequence that is either a closed ring or an open chain.
///
/// Rings do not repeat their first point at the end; the last point
/// connects back to the first implicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub points: Vec<Point2>,
    pub closed: bool,
}

impl Line {
    /// Creates a line from points.
    #[must_use]
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Creates a closed ring from `(x, y)` pairs.
    #[must_use]
    pub fn ring(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point2::new(x, y)).collect(), true)
    }

    /// Creates an open chain from `(x, y)` pairs.
    #[must_use]
    pub fn chain(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point2::new(x, y)).collect(), false)
    }

    /// Returns the number of segments in this line.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let n = self.points.len();
        if n < 2 {
            0
        } else if self.closed {
            n
        } else {
            n - 1
        }
    }

    /// Signed area of a ring; zero for chains.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        if self.closed {
            signed_area(&self.points)
        } else {
            0.0
        }
    }

    /// Returns the same line traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self::new(points, self.closed)
    }

    /// Checks every coordinate is finite.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` for the first NaN or infinite point.
    pub fn validate(&self) -> Result<()> {
        match self.points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            Some(p) => Err(GeometryError::NonFinite { x: p.x, y: p.y }.into()),
            None => Ok(()),
        }
    }

    /// Drops consecutive duplicate points (and the closing duplicate of a
    /// ring). Returns `None` when fewer than two distinct points remain.
    #[must_use]
    pub fn sanitized(&self) -> Option<Self> {
        let mut points: Vec<Point2> = Vec::with_capacity(self.points.len());
        for &p in &self.points {
            if points.last().is_none_or(|last| (p - last).norm() > TOLERANCE) {
                points.push(p);
            }
        }
        if self.closed {
            while points.len() > 1
                && points
                    .first()
                    .zip(points.last())
                    .is_some_and(|(first, last)| (first - last).norm() <= TOLERANCE)
            {
                points.pop();
            }
        }
        (points.len() >= 2).then(|| Self::new(points, self.closed))
    }

    /// Turns an open chain `p0..pn` into the zero-width ring
    /// `p0..pn, pn-1..p1`, whose left side covers both sides of the chain.
    /// Rings are returned unchanged.
    #[must_use]
    pub fn to_degenerate_ring(&self) -> Self {
        if self.closed {
            return self.clone();
        }
        let n = self.points.len();
        let mut points = self.points.clone();
        if n > 2 {
            points.extend(self.points[1..n - 1].iter().rev());
        }
        Self::new(points, true)
    }
}
