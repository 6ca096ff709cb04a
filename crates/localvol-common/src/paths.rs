//! On-disk layout of volumes and mount points.
//!
//! ```text
//! <root>/_volumes/<storage name>/   backing directory per volume
//! <root>/_mounts/<volume name>      symlink to the backing directory
//! ```

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;

/// Directory under the mount root holding volume storage.
pub const VOLUMES_DIR: &str = "_volumes";

/// Directory under the mount root holding mount symlinks.
pub const MOUNTS_DIR: &str = "_mounts";

/// Default mount root.
pub static DEFAULT_MOUNT_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("LOCALVOL_MOUNT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp/volumes"))
});

/// Layout rooted at an (absolute) mount root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePaths {
    /// Mount root directory.
    pub root: PathBuf,
}

impl VolumePaths {
    /// Create a layout under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parent of every storage directory.
    #[must_use]
    pub fn volumes(&self) -> PathBuf {
        self.root.join(VOLUMES_DIR)
    }

    /// Storage directory for an already resolved storage name.
    #[must_use]
    pub fn volume(&self, storage_name: &str) -> PathBuf {
        self.volumes().join(storage_name)
    }

    /// Parent of every mount symlink.
    #[must_use]
    pub fn mounts(&self) -> PathBuf {
        self.root.join(MOUNTS_DIR)
    }

    /// Mount symlink for a raw volume name.
    #[must_use]
    pub fn mount(&self, volume_name: &str) -> PathBuf {
        self.mounts().join(volume_name)
    }
}

/// Whether `name` names exactly one entry directly inside a directory.
///
/// Rejects `.`, `..`, anything with a `/`, and spellings such as `a/` that
/// [`Path::components`] would normalize.
#[must_use]
pub fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part == name,
        _ => false,
    }
}

impl Default for VolumePaths {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_ROOT.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let paths = VolumePaths::new("/srv/volumes");
        assert_eq!(paths.volumes(), PathBuf::from("/srv/volumes/_volumes"));
        assert_eq!(
            paths.volume("data"),
            PathBuf::from("/srv/volumes/_volumes/data")
        );
        assert_eq!(
            paths.mount("data_owner"),
            PathBuf::from("/srv/volumes/_mounts/data_owner")
        );
    }

    #[test]
    fn single_components() {
        for name in ["data", "A_1", "a.b", "..a", ".hidden"] {
            assert!(is_single_component(name), "{name}");
        }
        for name in ["", ".", "..", "a/b", "a/", "/a", "./a", "a/."] {
            assert!(!is_single_component(name), "{name}");
        }
    }
}
