//! Directory modes under a restrictive umask.
//!
//! The umask is process-wide, so this lives in its own test binary.

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use localvol::{DriverConfig, FileSystem, LocalDriver, RealFileSystem};
use tempfile::tempdir;

fn mode(path: &Path) -> u32 {
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

#[test]
fn directories_ignore_the_umask() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("root");
    let fs = RealFileSystem::new();
    let original = fs.umask(0o077);

    let driver = LocalDriver::new(DriverConfig::default().with_mount_root(&root));
    driver.create("v").unwrap();
    driver.mount("v").unwrap();
    let restored = fs.umask(original);

    assert_eq!(restored, 0o077);
    for dir in ["", "_volumes", "_volumes/v", "_mounts"] {
        assert_eq!(mode(&root.join(dir)), 0o777, "{dir}");
    }
}
