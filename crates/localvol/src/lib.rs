//! # localvol
//!
//! Volume lifecycle core of a local filesystem volume plugin.
//!
//! Volumes are plain directories under a mount root. Mounting a volume links
//! a per-name mount point to its storage directory; mounts are reference
//! counted so several consumers can share one volume.
//!
//! ## Usage
//!
//! ```no_run
//! use localvol::{DriverConfig, LocalDriver};
//!
//! # fn example() -> localvol_common::DriverResult<()> {
//! let driver = LocalDriver::new(DriverConfig::default().with_mount_root("/srv/volumes"));
//!
//! driver.create("data")?;
//! let mountpoint = driver.mount("data")?;
//! println!("mounted at {}", mountpoint.display());
//!
//! driver.unmount("data")?;
//! driver.remove("data")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod driver;
pub mod filesystem;

pub use config::DriverConfig;
pub use driver::{LocalDriver, VolumeInfo, VolumeRecord, VolumeRegistry};
pub use filesystem::{FileSystem, RealFileSystem, UmaskGuard};
