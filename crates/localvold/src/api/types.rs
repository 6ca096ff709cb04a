//! Request and response bodies of the volume plugin protocol.
//!
//! Field names follow the Docker volume plugin wire format. A missing mount
//! point is sent as an empty string and a successful call carries `"Err": ""`.

use std::collections::HashMap;
use std::path::Path;

use localvol::VolumeInfo;
use serde::{Deserialize, Serialize};

/// `VolumeDriver.Create` request.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateRequest {
    /// Volume name.
    pub name: String,
    /// Driver options; accepted but not interpreted.
    pub opts: Option<HashMap<String, serde_json::Value>>,
}

/// Request naming a single volume (`Get`, `Path`, `Remove`).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NamedRequest {
    /// Volume name.
    pub name: String,
}

/// `VolumeDriver.Mount` / `VolumeDriver.Unmount` request.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MountRequest {
    /// Volume name.
    pub name: String,
    /// Caller supplied mount id.
    #[serde(rename = "ID")]
    pub id: String,
}

/// Response carrying only an error message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Empty on success.
    #[serde(rename = "Err", default)]
    pub err: String,
}

/// Response to `Mount` and `Path`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MountResponse {
    /// Mount point of the volume.
    pub mountpoint: String,
    /// Empty on success.
    pub err: String,
}

/// A volume as seen on the wire.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WireVolume {
    /// Volume name.
    pub name: String,
    /// Mount point, or empty when not mounted.
    pub mountpoint: String,
}

/// Response to `Get`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetResponse {
    /// The volume.
    pub volume: WireVolume,
    /// Empty on success.
    pub err: String,
}

/// Response to `List`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListResponse {
    /// Every known volume.
    pub volumes: Vec<WireVolume>,
    /// Empty on success.
    pub err: String,
}

/// Response to `Plugin.Activate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    /// Plugin subsystems implemented.
    pub implements: Vec<String>,
}

/// Response to `VolumeDriver.Capabilities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    /// Driver capabilities.
    pub capabilities: CapabilityInfo,
}

/// Driver capability details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilityInfo {
    /// Visibility of volumes; always `local`.
    pub scope: String,
}

pub(crate) fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

impl From<VolumeInfo> for WireVolume {
    fn from(info: VolumeInfo) -> Self {
        Self {
            mountpoint: display_path(info.mountpoint.as_deref()),
            name: info.name,
        }
    }
}
