//! Plugin discovery files.
//!
//! Plugin hosts discover the driver by reading a file named after it from a
//! drivers directory. The plain `.spec` form holds just the URL; the `.json`
//! form also advertises whether unique volume ids are expected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Name the driver registers under.
pub const DRIVER_NAME: &str = "localdriver";

/// Contents of a JSON spec file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverSpec {
    /// Driver name.
    #[serde(rename = "Name")]
    pub name: String,
    /// URL the driver listens on.
    #[serde(rename = "Addr")]
    pub address: String,
    /// Whether volume names are encoded unique ids.
    #[serde(rename = "UniqueVolumeIds")]
    pub unique_volume_ids: bool,
}

impl DriverSpec {
    /// Spec for a driver listening on `listen_addr` over plain HTTP.
    #[must_use]
    pub fn new(listen_addr: &str, unique_volume_ids: bool) -> Self {
        Self {
            name: DRIVER_NAME.to_string(),
            address: advertised_url(listen_addr),
            unique_volume_ids,
        }
    }
}

/// URL advertised for a TCP listen address.
#[must_use]
pub fn advertised_url(listen_addr: &str) -> String {
    format!("http://{listen_addr}")
}

/// Write `<dir>/localdriver.spec` containing the advertised URL.
///
/// # Errors
///
/// Returns an error if the directory or the file cannot be written.
pub fn write_plain(dir: &Path, listen_addr: &str) -> io::Result<PathBuf> {
    write(dir, "spec", advertised_url(listen_addr).as_bytes())
}

/// Write `<dir>/localdriver.json` describing `spec`.
///
/// # Errors
///
/// Returns an error if the spec cannot be serialized or written.
pub fn write_json(dir: &Path, spec: &DriverSpec) -> io::Result<PathBuf> {
    let contents = serde_json::to_vec(spec)?;
    write(dir, "json", &contents)
}

fn write(dir: &Path, extension: &str, contents: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{DRIVER_NAME}.{extension}"));
    fs::write(&path, contents)?;

    tracing::info!(path = %path.display(), "Wrote driver spec file");
    Ok(path)
}
