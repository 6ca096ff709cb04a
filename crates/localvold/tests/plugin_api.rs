//! Integration tests for the plugin HTTP API.

use std::path::Path;
use std::sync::Arc;

use localvol::{DriverConfig, LocalDriver};
use localvold::api::types::{
    ActivateResponse, CapabilitiesResponse, ErrorResponse, GetResponse, ListResponse,
    MountResponse,
};
use localvold::api::{AppState, app};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

struct Plugin {
    base: String,
    client: reqwest::Client,
    fatal_rx: mpsc::UnboundedReceiver<String>,
    root: TempDir,
}

impl Plugin {
    async fn start(unique_volume_ids: bool) -> Self {
        let root = tempdir().unwrap();
        let config = DriverConfig::default()
            .with_mount_root(root.path())
            .with_unique_volume_ids(unique_volume_ids);
        let (state, fatal_rx) = AppState::new(Arc::new(LocalDriver::new(config)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            fatal_rx,
            root,
        }
    }

    fn root(&self) -> &Path {
        self.root.path()
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base)
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> (u16, T) {
        let request = self.client.post(self.url(endpoint)).json(&body);
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn create(&self, name: &str) -> (u16, ErrorResponse) {
        let body = json!({"Name": name, "Opts": {}});
        self.call("VolumeDriver.Create", body).await
    }

    async fn mount(&self, name: &str, id: &str) -> (u16, MountResponse) {
        let body = json!({"Name": name, "ID": id});
        self.call("VolumeDriver.Mount", body).await
    }

    async fn unmount(&self, name: &str, id: &str) -> (u16, ErrorResponse) {
        let body = json!({"Name": name, "ID": id});
        self.call("VolumeDriver.Unmount", body).await
    }

    async fn path(&self, name: &str) -> (u16, MountResponse) {
        let body = json!({"Name": name});
        self.call("VolumeDriver.Path", body).await
    }

    async fn get(&self, name: &str) -> (u16, GetResponse) {
        let body = json!({"Name": name});
        self.call("VolumeDriver.Get", body).await
    }

    async fn remove(&self, name: &str) -> (u16, ErrorResponse) {
        let body = json!({"Name": name});
        self.call("VolumeDriver.Remove", body).await
    }
}

#[tokio::test]
async fn handshake() {
    let plugin = Plugin::start(false).await;

    let (status, activate) = plugin
        .call::<ActivateResponse>("Plugin.Activate", json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(activate.implements, ["VolumeDriver"]);

    let (_, caps) = plugin
        .call::<CapabilitiesResponse>("VolumeDriver.Capabilities", json!({}))
        .await;
    assert_eq!(caps.capabilities.scope, "local");
}

#[tokio::test]
async fn volume_lifecycle() {
    let plugin = Plugin::start(false).await;
    let expected = plugin.root().join("_mounts/v").display().to_string();

    let (status, created) = plugin.create("v").await;
    assert_eq!(status, 200);
    assert_eq!(created.err, "");

    let (_, mounted) = plugin.mount("v", "c1").await;
    assert_eq!(mounted.mountpoint, expected);
    let (_, mounted) = plugin.mount("v", "c2").await;
    assert_eq!(mounted.mountpoint, expected);

    let (_, path) = plugin.path("v").await;
    assert_eq!(path.mountpoint, expected);

    let (status, _) = plugin.unmount("v", "c1").await;
    assert_eq!(status, 200);
    let (_, got) = plugin.get("v").await;
    assert_eq!(got.volume.mountpoint, expected);

    plugin.unmount("v", "c2").await;
    let (_, got) = plugin.get("v").await;
    assert_eq!(got.volume.name, "v");
    assert_eq!(got.volume.mountpoint, "");

    let (status, _) = plugin.remove("v").await;
    assert_eq!(status, 200);

    let (_, listed) = plugin
        .call::<ListResponse>("VolumeDriver.List", json!({}))
        .await;
    assert!(listed.volumes.is_empty());
    assert!(!plugin.root().join("_volumes/v").exists());
}

#[tokio::test]
async fn errors_are_reported_in_err() {
    let plugin = Plugin::start(false).await;

    let (status, created) = plugin.create("").await;
    assert_eq!(status, 500);
    assert_eq!(created.err, "Missing mandatory 'volume_name'");

    let (status, mounted) = plugin.mount("bla", "c1").await;
    assert_eq!(status, 500);
    assert_eq!(
        mounted.err,
        "Volume 'bla' must be created before being mounted"
    );
    assert_eq!(mounted.mountpoint, "");

    plugin.create("v").await;
    let (status, path) = plugin.path("v").await;
    assert_eq!(status, 500);
    assert_eq!(path.err, "Volume not previously mounted");
}

#[tokio::test]
async fn names_outside_the_layout_are_refused() {
    let plugin = Plugin::start(false).await;
    plugin.create("keep").await;

    let (status, created) = plugin.create("..").await;
    assert_eq!(status, 500);
    assert_eq!(created.err, "Invalid volume name '..'");

    let (status, removed) = plugin.remove("..").await;
    assert_eq!(status, 500);
    assert_eq!(removed.err, "Invalid volume name '..'");
    assert!(plugin.root().join("_volumes/keep").is_dir());
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let plugin = Plugin::start(false).await;

    let request = plugin.client.post(plugin.url("VolumeDriver.Create"));
    let response = request.body("{not json").send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: ErrorResponse = response.json().await.unwrap();
    assert!(body.err.starts_with("Invalid request body"));
}

#[tokio::test]
async fn list_accepts_empty_body() {
    let plugin = Plugin::start(false).await;
    plugin.create("a").await;

    let request = plugin.client.post(plugin.url("VolumeDriver.List"));
    let response = request.send().await.unwrap();
    let listed: ListResponse = response.json().await.unwrap();
    assert_eq!(listed.volumes.len(), 1);
    assert_eq!(listed.volumes[0].name, "a");
}

#[tokio::test]
async fn unique_ids_share_storage() {
    let plugin = Plugin::start(true).await;

    for name in ["A_1", "A_2"] {
        let (status, _) = plugin.create(name).await;
        assert_eq!(status, 200);
    }

    let (_, first) = plugin.mount("A_1", "c1").await;
    let (_, second) = plugin.mount("A_2", "c2").await;
    assert_ne!(first.mountpoint, second.mountpoint);

    let storage = plugin.root().join("_volumes/A");
    assert_eq!(std::fs::read_link(&first.mountpoint).unwrap(), storage);
    assert_eq!(std::fs::read_link(&second.mountpoint).unwrap(), storage);
}

#[tokio::test]
async fn unrecoverable_errors_are_escalated() {
    let mut plugin = Plugin::start(true).await;

    let (status, created) = plugin.create("plain").await;
    assert_eq!(status, 500);
    assert_eq!(created.err, "Invalid unique volume id: plain");

    let reason = plugin.fatal_rx.recv().await;
    assert_eq!(reason.as_deref(), Some("Invalid unique volume id: plain"));
}
