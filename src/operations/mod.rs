mod buffer;
mod centerline;
mod centerpoint;
mod offset;
mod skeleton_graph;
mod smooth;

pub use buffer::Buffer;
pub use centerline::{Centerlines, DEFAULT_FRACTION};
pub use centerpoint::{Centerpoint, Centerpoints};
pub use offset::Offset;
pub use skeleton_graph::{SkeletonEdge, SkeletonGraph};
pub use smooth::Smooth;
