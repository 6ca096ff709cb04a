//! Error types for the localvol driver.
//!
//! The `Display` text of every [`DriverError`] is the message handed back to
//! plugin clients, so it must stay stable.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`DriverError`].
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors returned by volume lifecycle operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DriverError {
    /// The request did not name a volume.
    #[error("Missing mandatory 'volume_name'")]
    #[diagnostic(code(localvol::request::missing_name))]
    MissingName,

    /// No volume is registered under this name.
    #[error("Volume '{name}' not found")]
    #[diagnostic(code(localvol::volume::not_found))]
    NotFound {
        /// The requested volume name.
        name: String,
    },

    /// The name cannot be used as a single path component.
    #[error("Invalid volume name '{name}'")]
    #[diagnostic(
        code(localvol::request::invalid_name),
        help("Volume names must not be '.', '..' or contain '/'")
    )]
    InvalidName {
        /// The rejected volume name.
        name: String,
    },

    /// Mount was requested for a volume that was never created.
    #[error("Volume '{name}' must be created before being mounted")]
    #[diagnostic(
        code(localvol::volume::not_created),
        help("Create the volume before mounting it")
    )]
    NotCreated {
        /// The requested volume name.
        name: String,
    },

    /// The volume exists but holds no mount point.
    #[error("Volume not previously mounted")]
    #[diagnostic(code(localvol::volume::not_mounted))]
    NotMounted,

    /// The reference count is saturated.
    #[error("Volume '{name}' has too many mounts")]
    #[diagnostic(code(localvol::volume::too_many_mounts))]
    TooManyMounts {
        /// The volume name.
        name: String,
    },

    /// The backing storage directory disappeared after creation.
    #[error("Volume '{name}' is missing")]
    #[diagnostic(
        code(localvol::volume::missing),
        help("Storage was removed outside the driver; remove and recreate the volume")
    )]
    MissingStorage {
        /// The volume whose storage is gone.
        name: String,
    },

    /// Probing the backing storage directory failed for a reason other than absence.
    #[error("Error establishing whether volume storage exists: {source}")]
    #[diagnostic(code(localvol::volume::storage_probe))]
    StorageProbe {
        /// The probed storage directory.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// Probing the mount point failed for a reason other than absence.
    #[error("Error establishing whether volume exists")]
    #[diagnostic(code(localvol::mount::probe))]
    MountProbe {
        /// The probed mount point.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// The recorded mount point no longer exists on disk.
    #[error("Volume {name} does not exist (path: {}), nothing to do!", path.display())]
    #[diagnostic(code(localvol::mount::gone))]
    MountpointGone {
        /// The volume name.
        name: String,
        /// The recorded mount point.
        path: PathBuf,
    },

    /// Creating the mount symlink failed.
    #[error("Error mounting volume: {0}")]
    #[diagnostic(code(localvol::mount::link))]
    Link(#[source] io::Error),

    /// Removing the mount symlink failed.
    #[error("Error unmounting volume: {0}")]
    #[diagnostic(code(localvol::mount::unlink))]
    Unlink(#[source] io::Error),

    /// Deleting the storage directory tree failed.
    #[error("Failed removing mount path: {0}")]
    #[diagnostic(code(localvol::volume::remove))]
    RemoveStorage(#[source] io::Error),

    /// A broken environment or configuration; not meant to be retried.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Unrecoverable(#[from] UnrecoverableError),
}

impl DriverError {
    /// Whether the caller should escalate instead of reporting and carrying on.
    #[must_use]
    pub const fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Unrecoverable(_))
    }
}

/// Precondition violations that indicate a broken environment.
#[derive(Error, Diagnostic, Debug)]
pub enum UnrecoverableError {
    /// The configured mount root could not be made absolute.
    #[error("Failed to resolve absolute path of {}: {source}", path.display())]
    #[diagnostic(code(localvol::fatal::absolute))]
    Absolute {
        /// The configured mount root.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// A layout directory could not be created.
    #[error("Failed creating path {}: {source}", path.display())]
    #[diagnostic(
        code(localvol::fatal::create_dir),
        help("Check that the mount root is writable by the driver")
    )]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: io::Error,
    },

    /// A volume name could not be decoded as a unique volume id.
    #[error("Invalid unique volume id: {id}")]
    #[diagnostic(
        code(localvol::fatal::volume_id),
        help("Unique volume ids look like '<prefix>_<suffix>', with '_' escaped as '='")
    )]
    InvalidVolumeId {
        /// The offending volume name.
        id: String,
    },
}
