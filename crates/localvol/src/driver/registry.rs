//! In-memory volume bookkeeping.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRecord {
    /// Volume name; the registry key.
    pub name: String,
    /// Current mount point, present while `mount_count > 0`.
    pub mountpoint: Option<PathBuf>,
    /// Number of outstanding mount requests.
    pub mount_count: u32,
}

impl VolumeRecord {
    /// A freshly created, unmounted volume.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mountpoint: None,
            mount_count: 0,
        }
    }

    /// Public view of this record.
    #[must_use]
    pub fn info(&self) -> VolumeInfo {
        VolumeInfo {
            name: self.name.clone(),
            mountpoint: self.mountpoint.clone(),
        }
    }
}

/// What callers get to see of a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Volume name.
    pub name: String,
    /// Mount point, if mounted.
    pub mountpoint: Option<PathBuf>,
}

/// Name-keyed map of volume records.
///
/// Not synchronized; the driver keeps it behind its lock.
#[derive(Debug, Default, Clone)]
pub struct VolumeRegistry {
    volumes: HashMap<String, VolumeRecord>,
}

impl VolumeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VolumeRecord> {
        self.volumes.get(name)
    }

    /// Look up a record for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut VolumeRecord> {
        self.volumes.get_mut(name)
    }

    /// Whether a record exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    /// Insert `record` unless its name is taken. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, record: VolumeRecord) -> bool {
        if self.volumes.contains_key(&record.name) {
            return false;
        }
        self.volumes.insert(record.name.clone(), record);
        true
    }

    /// Delete a record.
    pub fn remove(&mut self, name: &str) -> Option<VolumeRecord> {
        self.volumes.remove(name)
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &VolumeRecord> {
        self.volumes.values()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl FromIterator<VolumeRecord> for VolumeRegistry {
    fn from_iter<I: IntoIterator<Item = VolumeRecord>>(iter: I) -> Self {
        let mut registry = Self::new();
        for record in iter {
            registry.insert_if_absent(record);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_if_absent_keeps_existing() {
        let mut registry = VolumeRegistry::new();
        assert!(registry.insert_if_absent(VolumeRecord::new("data")));

        let mut mounted = VolumeRecord::new("data");
        mounted.mount_count = 3;
        assert!(!registry.insert_if_absent(mounted));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("data").unwrap().mount_count, 0);
    }

    #[test]
    fn remove_and_enumerate() {
        let mut registry: VolumeRegistry =
            ["a", "b", "c"].into_iter().map(VolumeRecord::new).collect();

        assert!(registry.remove("b").is_some());
        assert!(registry.remove("b").is_none());

        let mut names: Vec<_> = registry.records().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn info_hides_refcount() {
        let mut record = VolumeRecord::new("data");
        record.mountpoint = Some(PathBuf::from("/r/_mounts/data"));
        record.mount_count = 2;

        assert_eq!(
            record.info(),
            VolumeInfo {
                name: "data".to_string(),
                mountpoint: Some(PathBuf::from("/r/_mounts/data")),
            }
        );
    }
}
