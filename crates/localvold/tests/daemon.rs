//! End-to-end tests of the daemon binary and its run loop.

use std::time::Duration;

use assert_cmd::Command;
use clap::Parser;
use localvold::cli::Args;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn help_lists_flags() {
    Command::cargo_bin("localvold")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--mount-dir"))
        .stdout(predicate::str::contains("--unique-volume-ids"));
}

#[test]
fn unknown_transport_fails() {
    Command::cargo_bin("localvold")
        .unwrap()
        .args(["--transport", "udp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[tokio::test]
async fn writes_json_spec_and_aborts_on_unrecoverable_error() {
    let temp = tempdir().unwrap();
    let drivers = temp.path().join("drivers");
    let mounts = temp.path().join("mounts");
    let addr = format!("127.0.0.1:{}", free_port());

    let args = Args::try_parse_from([
        "localvold",
        "--transport",
        "tcp-json",
        "--unique-volume-ids",
        "--listen-addr",
        addr.as_str(),
        "--drivers-path",
        drivers.to_str().unwrap(),
        "--mount-dir",
        mounts.to_str().unwrap(),
    ])
    .unwrap();
    let daemon = tokio::spawn(localvold::run(args));

    let client = reqwest::Client::new();
    let url = format!("http://{addr}/VolumeDriver.Create");
    let body = json!({"Name": "no-separator"});
    let mut status = None;
    for _ in 0..50 {
        match client.post(&url).json(&body).send().await {
            Ok(response) => {
                status = Some(response.status().as_u16());
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
    assert_eq!(status, Some(500));
    drop(client);

    let err = daemon.await.unwrap().unwrap_err().to_string();
    assert!(err.contains("Invalid unique volume id: no-separator"));

    let written = std::fs::read_to_string(drivers.join("localdriver.json")).unwrap();
    let spec: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(spec["Addr"], format!("http://{addr}"));
    assert_eq!(spec["UniqueVolumeIds"], true);
}
