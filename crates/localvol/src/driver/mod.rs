//! Volume lifecycle management.
//!
//! This module provides the [`LocalDriver`] and the pieces it is built from:
//! the [`VolumeRegistry`] holding per-volume state and the [`PathResolver`]
//! deriving on-disk locations.

mod local;
mod registry;
mod resolver;

pub use local::LocalDriver;
pub use registry::{VolumeInfo, VolumeRecord, VolumeRegistry};
pub use resolver::{DIR_MODE, PathResolver};
