use crate::math::Point2;

/// Axis-aligned bounding box, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point2,
    pub max: Point2,
}

impl Default for Aabb {
    /// The empty box: combines with any box to yield that box and
    /// intersects nothing.
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// A box that contains nothing.
    pub const EMPTY: Self = Self {
        min: Point2::new(f64::INFINITY, f64::INFINITY),
        max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// A box that contains everything.
    pub const EVERYTHING: Self = Self {
        min: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        max: Point2::new(f64::INFINITY, f64::INFINITY),
    };

    /// Smallest box containing all `points`; [`Aabb::EMPTY`] for none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2>) -> Self {
        points.into_iter().fold(Self::EMPTY, |bbox, p| bbox.include(p))
    }

    /// Returns the box grown to contain `p`.
    #[must_use]
    pub fn include(&self, p: &Point2) -> Self {
        Self {
            min: Point2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// Smallest box bounding both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Returns the box grown by `margin` on every side.
    #[must_use]
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Whether the box is inverted (contains no point).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Check if two boxes overlap, including touching. False if either is empty.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether `other` lies entirely inside this box. The empty box lies
    /// inside every box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.is_empty()
            || (self.min.x <= other.min.x
                && self.min.y <= other.min.y
                && self.max.x >= other.max.x
                && self.max.y >= other.max.y)
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_combines_to_other() {
        let b = Aabb::from_points(&[Point2::new(1.0, 2.0), Point2::new(3.0, -1.0)]);
        assert_eq!(Aabb::EMPTY.union(&b), b);
        assert!(!Aabb::EMPTY.intersects(&b));
        assert!(Aabb::EVERYTHING.intersects(&b));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::from_points(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]);
        let b = Aabb::from_points(&[Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)]);
        let c = Aabb::from_points(&[Point2::new(1.5, 1.5), Point2::new(2.0, 2.0)]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.expand(0.5).intersects(&c));
    }

    #[test]
    fn containment() {
        let outer = Aabb::from_points(&[Point2::new(0.0, 0.0), Point2::new(4.0, 4.0)]);
        let inner = Aabb::from_points(&[Point2::new(1.0, 1.0), Point2::new(4.0, 2.0)]);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&Aabb::EMPTY));
        assert!(!Aabb::EMPTY.contains(&inner));
        assert!(Aabb::EVERYTHING.contains(&outer));
    }
}
