//! The local volume driver.

use std::path::{Path, PathBuf};

use localvol_common::{DriverError, DriverResult, UnrecoverableError, is_single_component};
use parking_lot::Mutex;

use super::registry::{VolumeInfo, VolumeRecord, VolumeRegistry};
use super::resolver::{DIR_MODE, PathResolver};
use crate::config::DriverConfig;
use crate::filesystem::{FileSystem, RealFileSystem, UmaskGuard};

/// Lifecycle orchestrator for local volumes.
///
/// Every operation holds the registry lock from start to finish. That lock
/// also covers the umask changes made while creating directories and links,
/// so callers may share one driver across threads freely.
pub struct LocalDriver<F: FileSystem = RealFileSystem> {
    resolver: PathResolver<F>,
    registry: Mutex<VolumeRegistry>,
}

impl LocalDriver<RealFileSystem> {
    /// Create a driver on the host filesystem.
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        Self::with_filesystem(RealFileSystem::new(), config)
    }
}

impl<F: FileSystem> LocalDriver<F> {
    /// Create a driver doing I/O through `fs`.
    pub fn with_filesystem(fs: F, config: DriverConfig) -> Self {
        Self::with_state(VolumeRegistry::new(), fs, config)
    }

    /// Create a driver over an existing registry.
    pub fn with_state(registry: VolumeRegistry, fs: F, config: DriverConfig) -> Self {
        Self {
            resolver: PathResolver::new(fs, &config),
            registry: Mutex::new(registry),
        }
    }

    /// The filesystem the driver works on.
    pub const fn filesystem(&self) -> &F {
        self.resolver.fs()
    }

    /// Create a volume and its storage directory.
    ///
    /// Creating a name that already exists succeeds without touching it.
    ///
    /// # Errors
    ///
    /// [`DriverError::MissingName`] for an empty name; unrecoverable errors
    /// if the storage directory cannot be created.
    pub fn create(&self, name: &str) -> DriverResult<()> {
        let _span = tracing::info_span!("create", volume = name).entered();
        let mut registry = self.registry.lock();
        require_name(name)?;

        if registry.contains(name) {
            tracing::debug!("Volume already exists");
            return Ok(());
        }

        let storage = self.resolver.storage_dir(name)?;
        tracing::info!(path = %storage.display(), "Creating volume folder");
        {
            let _umask = UmaskGuard::clear(self.filesystem());
            self.filesystem()
                .mkdir_all(&storage, DIR_MODE)
                .map_err(|source| {
                    tracing::error!(
                        path = %storage.display(),
                        error = %source,
                        "Failed creating path"
                    );
                    UnrecoverableError::CreateDir {
                        path: storage.clone(),
                        source,
                    }
                })?;
        }

        registry.insert_if_absent(VolumeRecord::new(name));
        tracing::info!("Volume created");
        Ok(())
    }

    /// Mount a volume, returning its mount point.
    ///
    /// The first mount links the mount point to the storage directory; later
    /// mounts only bump the reference count.
    ///
    /// # Errors
    ///
    /// Fails for an empty, invalid or unknown name, when the storage directory
    /// is gone or cannot be probed, when the reference count is saturated, or
    /// when the link cannot be created. None of these change the count.
    pub fn mount(&self, name: &str) -> DriverResult<PathBuf> {
        let _span = tracing::info_span!("mount", volume = name).entered();
        let mut registry = self.registry.lock();
        require_name(name)?;

        let record = registry
            .get_mut(name)
            .ok_or_else(|| DriverError::NotCreated {
                name: name.to_string(),
            })?;

        let storage = self.resolver.storage_dir(name)?;
        match self.filesystem().exists(&storage) {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(path = %storage.display(), "Volume storage is missing");
                return Err(DriverError::MissingStorage {
                    name: name.to_string(),
                });
            }
            Err(source) => {
                tracing::error!(
                    path = %storage.display(),
                    error = %source,
                    "Failed to probe volume storage"
                );
                return Err(DriverError::StorageProbe {
                    path: storage,
                    source,
                });
            }
        }

        let mount_dir = self.resolver.mount_dir(name)?;
        tracing::info!(mountpoint = %mount_dir.display(), "Mounting volume");

        let mount_count = record.mount_count.checked_add(1).ok_or_else(|| {
            tracing::error!(count = record.mount_count, "Mount count saturated");
            DriverError::TooManyMounts {
                name: name.to_string(),
            }
        })?;

        if record.mount_count == 0 {
            tracing::debug!(src = %storage.display(), tgt = %mount_dir.display(), "Linking");
            let _umask = UmaskGuard::clear(self.filesystem());
            self.filesystem()
                .symlink(&storage, &mount_dir)
                .map_err(|source| {
                    tracing::error!(error = %source, "Mount failed");
                    DriverError::Link(source)
                })?;
            record.mountpoint = Some(mount_dir.clone());
        }

        record.mount_count = mount_count;
        tracing::info!(count = record.mount_count, "Volume mounted");

        Ok(record.mountpoint.clone().unwrap_or(mount_dir))
    }

    /// Release one mount of a volume.
    ///
    /// The link is removed once the last mount is released.
    ///
    /// # Errors
    ///
    /// Fails for an empty, unknown or unmounted volume, when the mount point
    /// is gone or cannot be probed, or when the link cannot be removed.
    pub fn unmount(&self, name: &str) -> DriverResult<()> {
        let _span = tracing::info_span!("unmount", volume = name).entered();
        let mut registry = self.registry.lock();
        require_name(name)?;

        let mountpoint = mounted_path(&registry, name)?;
        self.release(&mut registry, name, &mountpoint)
    }

    /// Current mount point of a mounted volume.
    ///
    /// # Errors
    ///
    /// Fails for an empty, unknown or unmounted volume.
    pub fn path(&self, name: &str) -> DriverResult<PathBuf> {
        let _span = tracing::info_span!("path", volume = name).entered();
        let registry = self.registry.lock();
        require_name(name)?;

        mounted_path(&registry, name)
    }

    /// Look up a volume.
    ///
    /// # Errors
    ///
    /// [`DriverError::NotFound`] if no such volume exists.
    pub fn get(&self, name: &str) -> DriverResult<VolumeInfo> {
        let _span = tracing::debug_span!("get", volume = name).entered();
        let registry = self.registry.lock();

        registry
            .get(name)
            .map(VolumeRecord::info)
            .ok_or_else(|| DriverError::NotFound {
                name: name.to_string(),
            })
    }

    /// All volumes, in no particular order.
    pub fn list(&self) -> Vec<VolumeInfo> {
        let registry = self.registry.lock();
        registry.records().map(VolumeRecord::info).collect()
    }

    /// Snapshot of a volume's full record, including its reference count.
    pub fn record(&self, name: &str) -> Option<VolumeRecord> {
        self.registry.lock().get(name).cloned()
    }

    /// Delete a volume and its storage.
    ///
    /// A mounted volume is released once first, exactly as [`unmount`] would.
    /// Only a single reference is dropped: with several outstanding mounts the
    /// link survives, pointing at the deleted storage.
    ///
    /// [`unmount`]: Self::unmount
    ///
    /// # Errors
    ///
    /// Fails for an empty or unknown name, if releasing the mount fails, or
    /// if the storage tree cannot be deleted.
    pub fn remove(&self, name: &str) -> DriverResult<()> {
        let _span = tracing::info_span!("remove", volume = name).entered();
        let mut registry = self.registry.lock();
        require_name(name)?;

        let record = registry.get(name).ok_or_else(|| {
            tracing::error!("Volume not found");
            DriverError::NotFound {
                name: name.to_string(),
            }
        })?;

        if let Some(mountpoint) = record.mountpoint.clone() {
            self.release(&mut registry, name, &mountpoint)?;
        }

        let storage = self.resolver.storage_dir(name)?;
        tracing::info!(path = %storage.display(), "Removing volume folder");
        self.filesystem().remove_all(&storage).map_err(|source| {
            tracing::error!(error = %source, "Failed removing volume");
            DriverError::RemoveStorage(source)
        })?;

        registry.remove(name);
        tracing::info!("Volume removed");
        Ok(())
    }

    /// Drop one reference to `name`, unlinking `mountpoint` on the last one.
    ///
    /// State is left untouched on every failure path.
    fn release(
        &self,
        registry: &mut VolumeRegistry,
        name: &str,
        mountpoint: &Path,
    ) -> DriverResult<()> {
        match self.filesystem().exists(mountpoint) {
            Ok(true) => {}
            Ok(false) => {
                let err = DriverError::MountpointGone {
                    name: name.to_string(),
                    path: mountpoint.to_path_buf(),
                };
                tracing::error!(error = %err, "Mount point not found");
                return Err(err);
            }
            Err(source) => {
                tracing::error!(
                    mountpoint = %mountpoint.display(),
                    error = %source,
                    "Failed retrieving mount info"
                );
                return Err(DriverError::MountProbe {
                    path: mountpoint.to_path_buf(),
                    source,
                });
            }
        }

        let record = registry
            .get_mut(name)
            .ok_or_else(|| DriverError::NotFound {
                name: name.to_string(),
            })?;

        let remaining = record.mount_count.saturating_sub(1);
        if remaining > 0 {
            record.mount_count = remaining;
            tracing::info!(count = remaining, "Volume still in use");
            return Ok(());
        }

        tracing::info!(mountpoint = %mountpoint.display(), "Unlinking mount point");
        self.filesystem().remove(mountpoint).map_err(|source| {
            tracing::error!(error = %source, "Unmount failed");
            DriverError::Unlink(source)
        })?;

        record.mount_count = 0;
        record.mountpoint = None;
        tracing::info!("Volume unmounted");
        Ok(())
    }
}

fn require_name(name: &str) -> DriverResult<()> {
    if name.is_empty() {
        return Err(DriverError::MissingName);
    }
    if !is_single_component(name) {
        tracing::error!("Volume name is not a plain directory name");
        return Err(DriverError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn mounted_path(registry: &VolumeRegistry, name: &str) -> DriverResult<PathBuf> {
    let record = registry.get(name).ok_or_else(|| {
        tracing::error!("No such volume");
        DriverError::NotFound {
            name: name.to_string(),
        }
    })?;

    record.mountpoint.clone().ok_or_else(|| {
        tracing::error!("Mount point not assigned");
        DriverError::NotMounted
    })
}
