//! Driver configuration.

use std::path::PathBuf;

use localvol_common::paths::DEFAULT_MOUNT_ROOT;

/// Boot-time driver options. Fixed for the lifetime of a driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Directory under which `_volumes` and `_mounts` live.
    pub mount_root: PathBuf,
    /// Treat volume names as encoded unique volume ids.
    pub unique_volume_ids: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mount_root: DEFAULT_MOUNT_ROOT.clone(),
            unique_volume_ids: false,
        }
    }
}

impl DriverConfig {
    /// Set the mount root.
    #[must_use]
    pub fn with_mount_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.mount_root = root.into();
        self
    }

    /// Enable or disable unique volume id decoding.
    #[must_use]
    pub const fn with_unique_volume_ids(mut self, enabled: bool) -> Self {
        self.unique_volume_ids = enabled;
        self
    }
}
