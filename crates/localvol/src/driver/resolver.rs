//! Storage and mount path derivation.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use localvol_common::paths::is_single_component;
use localvol_common::{DriverError, DriverResult, UniqueVolumeId, UnrecoverableError, VolumePaths};

use crate::config::DriverConfig;
use crate::filesystem::{FileSystem, UmaskGuard};

/// Permission bits for every directory the driver creates.
pub const DIR_MODE: u32 = 0o777;

/// Derives the storage directory and mount point of a volume.
///
/// Both lookups make sure their parent directory exists, creating it with
/// [`DIR_MODE`] under a cleared umask. That side effect is idempotent.
#[derive(Debug)]
pub struct PathResolver<F> {
    fs: F,
    mount_root: PathBuf,
    unique_volume_ids: bool,
}

impl<F: FileSystem> PathResolver<F> {
    /// Create a resolver for `config` doing I/O through `fs`.
    pub fn new(fs: F, config: &DriverConfig) -> Self {
        Self {
            fs,
            mount_root: config.mount_root.clone(),
            unique_volume_ids: config.unique_volume_ids,
        }
    }

    /// The filesystem this resolver works on.
    pub const fn fs(&self) -> &F {
        &self.fs
    }

    /// `<root>/_volumes/<storage name>`.
    ///
    /// # Errors
    ///
    /// Fails if the mount root cannot be made absolute, `_volumes` cannot be
    /// created, or the name is not a valid unique volume id in that mode.
    pub fn storage_dir(&self, volume_name: &str) -> DriverResult<PathBuf> {
        let layout = self.layout()?;
        self.ensure_dir(&layout.volumes())?;

        let storage_name = self.storage_name(volume_name)?;
        Ok(layout.volume(&storage_name))
    }

    /// `<root>/_mounts/<volume name>`, always keyed by the raw name.
    ///
    /// # Errors
    ///
    /// Fails if the mount root cannot be made absolute or `_mounts` cannot be
    /// created.
    pub fn mount_dir(&self, volume_name: &str) -> Result<PathBuf, UnrecoverableError> {
        let layout = self.layout()?;
        self.ensure_dir(&layout.mounts())?;

        Ok(layout.mount(volume_name))
    }

    /// Name of the storage directory backing `volume_name`.
    ///
    /// # Errors
    ///
    /// Fails if unique ids are enabled and the name does not decode, or
    /// decodes to a prefix that is not a plain directory name.
    pub fn storage_name<'a>(&self, volume_name: &'a str) -> DriverResult<Cow<'a, str>> {
        if !self.unique_volume_ids {
            return Ok(Cow::Borrowed(volume_name));
        }

        let id = UniqueVolumeId::decode(volume_name).inspect_err(|err| {
            tracing::error!(
                volume = volume_name,
                error = %err,
                "Failed to decode unique volume id"
            );
        })?;
        if !is_single_component(&id.prefix) {
            tracing::error!(volume = volume_name, prefix = %id.prefix, "Invalid storage prefix");
            return Err(DriverError::InvalidName {
                name: volume_name.to_string(),
            });
        }
        Ok(Cow::Owned(id.prefix))
    }

    /// Create `dir` (and parents) with [`DIR_MODE`] under a cleared umask.
    ///
    /// # Errors
    ///
    /// Any creation failure is unrecoverable.
    pub fn ensure_dir(&self, dir: &Path) -> Result<(), UnrecoverableError> {
        let _umask = UmaskGuard::clear(&self.fs);
        self.fs.mkdir_all(dir, DIR_MODE).map_err(|source| {
            tracing::error!(path = %dir.display(), error = %source, "Failed creating path");
            UnrecoverableError::CreateDir {
                path: dir.to_path_buf(),
                source,
            }
        })
    }

    fn layout(&self) -> Result<VolumePaths, UnrecoverableError> {
        let root = self.fs.absolute(&self.mount_root).map_err(|source| {
            tracing::error!(
                path = %self.mount_root.display(),
                error = %source,
                "Failed to resolve mount root"
            );
            UnrecoverableError::Absolute {
                path: self.mount_root.clone(),
                source,
            }
        })?;
        Ok(VolumePaths::new(root))
    }
}
