use super::aabb::Aabb;
use super::hilbert::xy_to_hilbert;

/// Packed Hilbert R-tree over bounding boxes.
///
/// Bulk-loaded once: leaves are sorted by the Hilbert index of their box
/// centres and stored at the bottom of a complete binary tree held in a flat
/// array, with each parent bounding its two children. Padding leaves carry
/// [`Aabb::EMPTY`], which never matches a query.
#[derive(Debug, Clone)]
pub struct RTree<T> {
    bounds: Vec<Aabb>,
    items: Vec<T>,
    first_leaf_index: usize,
}

impl<T> Default for RTree<T> {
    fn default() -> Self {
        Self {
            bounds: Vec::new(),
            items: Vec::new(),
            first_leaf_index: 0,
        }
    }
}

impl<T> RTree<T> {
    /// Builds the tree from `(bbox, item)` pairs.
    pub fn bulk_load(entries: impl IntoIterator<Item = (Aabb, T)>) -> Self {
        let mut entries: Vec<(Aabb, T)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Self::default();
        }

        let extent = entries
            .iter()
            .fold(Aabb::EMPTY, |extent, (bbox, _)| extent.union(bbox));
        let width = (extent.max.x - extent.min.x).max(f64::MIN_POSITIVE);
        let height = (extent.max.y - extent.min.y).max(f64::MIN_POSITIVE);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let to_grid = |value: f64, min: f64, span: f64| -> u16 {
            let scaled = ((value - min) / span * f64::from(u16::MAX)).clamp(0.0, f64::from(u16::MAX));
            if scaled.is_finite() {
                scaled as u16
            } else {
                0
            }
        };
        entries.sort_by_cached_key(|(bbox, _)| {
            let centre = bbox.center();
            xy_to_hilbert(
                to_grid(centre.x, extent.min.x, width),
                to_grid(centre.y, extent.min.y, height),
            )
        });

        let leaf_capacity = entries.len().next_power_of_two();
        let first_leaf_index = leaf_capacity - 1;
        let mut bounds = vec![Aabb::EMPTY; first_leaf_index + leaf_capacity];
        let mut items = Vec::with_capacity(entries.len());
        for (offset, (bbox, item)) in entries.into_iter().enumerate() {
            bounds[first_leaf_index + offset] = bbox;
            items.push(item);
        }
        for i in (0..first_leaf_index).rev() {
            bounds[i] = bounds[left_child(i)].union(&bounds[right_child(i)]);
        }

        Self {
            bounds,
            items,
            first_leaf_index,
        }
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the tree holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over every item whose box overlaps `query`.
    pub fn search<'a>(&'a self, query: &Aabb) -> impl Iterator<Item = &'a T> + 'a {
        let query = *query;
        let mut stack = Vec::new();
        if self.bounds.first().is_some_and(|root| root.intersects(&query)) {
            stack.push(0);
        }
        std::iter::from_fn(move || {
            while let Some(index) = stack.pop() {
                if index >= self.first_leaf_index {
                    return self.items.get(index - self.first_leaf_index);
                }
                // Right first so the left subtree is visited first.
                for child in [right_child(index), left_child(index)] {
                    if self.bounds[child].intersects(&query) {
                        stack.push(child);
                    }
                }
            }
            None
        })
    }
}

fn left_child(i: usize) -> usize {
    2 * i + 1
}

fn right_child(i: usize) -> usize {
    2 * i + 2
}
