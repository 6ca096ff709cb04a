//! Filesystem access for the driver.
//!
//! This module handles:
//! - The [`FileSystem`] capability the driver performs all I/O through
//! - The host implementation backed by `std::fs` and `rustix`
//! - Scoped clearing of the process umask

mod host;
mod umask;

use std::io;
use std::path::{Path, PathBuf};

pub use host::RealFileSystem;
pub use umask::UmaskGuard;

/// Filesystem operations the driver depends on.
///
/// Every path handed to the driver's filesystem goes through this trait, so
/// tests can substitute failures without touching the host.
pub trait FileSystem: Send + Sync {
    /// Create `path` and any missing parents with the given permission bits.
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Whether `path` exists, following symlinks.
    ///
    /// A missing entry is `Ok(false)`; any other probe failure is an error.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Remove `path` and everything below it. Absent paths are not an error.
    fn remove_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a single entry such as a symlink.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Create a symlink at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Make `path` absolute without resolving symlinks.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;

    /// Set the process file creation mask, returning the previous one.
    fn umask(&self, mask: u32) -> u32;
}
