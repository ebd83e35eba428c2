pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod skeleton;
pub mod spatial;

pub use error::{Error, Result};
