mod node;
mod nodes;
mod options;
mod queue;
mod readout;
mod solve;
mod wavefront;

pub use node::{Node, NodeId, NodeKind, NormalId};
pub use nodes::{Change, Nodes};
pub use options::{Options, DEFAULT_ROUNDING_ANGLE};
pub use wavefront::{Skeleton, Wavefront};
