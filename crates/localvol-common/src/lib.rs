//! # localvol-common
//!
//! Shared types for the localvol volume plugin.
//!
//! This crate provides functionality used by both the driver core and the
//! plugin daemon:
//! - The driver error taxonomy
//! - The on-disk layout of volumes and mount points
//! - Unique volume id encoding

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;

pub use error::{DriverError, DriverResult, UnrecoverableError};
pub use id::UniqueVolumeId;
pub use paths::{MOUNTS_DIR, VOLUMES_DIR, VolumePaths, is_single_component};
