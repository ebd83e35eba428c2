mod aabb;
mod hilbert;
mod rtree;

pub use aabb::Aabb;
pub use rtree::RTree;
