//! localvold - local volume plugin daemon.
//!
//! Serves the volume plugin protocol over HTTP (TCP or a unix socket) in
//! front of a [`localvol::LocalDriver`], and advertises itself to plugin
//! hosts through a spec file.

#![warn(missing_docs)]

pub mod api;
pub mod cli;
pub mod spec_file;

use std::sync::Arc;

use anyhow::{Context, bail};
use localvol::LocalDriver;
use tokio::net::{TcpListener, UnixListener};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{mpsc, oneshot};

use crate::api::AppState;
use crate::cli::{Args, Transport};
use crate::spec_file::DriverSpec;

/// Run the daemon until it is signalled or the driver hits an unrecoverable error.
///
/// # Errors
///
/// Fails if the spec file cannot be written, the listener cannot be bound,
/// the server fails, or the driver reported an unrecoverable error.
pub async fn run(args: Args) -> anyhow::Result<()> {
    if args.unique_volume_ids && !args.unique_volume_ids_enabled() {
        tracing::warn!(
            transport = ?args.transport,
            "Unique volume ids are only supported with the tcp-json transport; ignoring"
        );
    }

    let config = args.driver_config();
    tracing::info!(
        mount_dir = %config.mount_root.display(),
        unique_volume_ids = config.unique_volume_ids,
        "Starting local driver"
    );
    let driver = Arc::new(LocalDriver::new(config));
    let (state, fatal_rx) = AppState::new(driver);
    let app = api::app(state);

    let (reason_tx, reason_rx) = oneshot::channel();
    let shutdown = shutdown_signal(fatal_rx, reason_tx);

    match args.transport {
        Transport::Tcp | Transport::TcpJson => {
            write_spec_file(&args)?;
            let listener = TcpListener::bind(&args.listen_addr)
                .await
                .with_context(|| format!("failed to bind {}", args.listen_addr))?;
            tracing::info!(addr = %args.listen_addr, "Driver listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await?;
        }
        Transport::Unix => {
            // A socket left behind by a previous run blocks the bind.
            match std::fs::remove_file(&args.listen_addr) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    return Err(e).context("failed to remove stale socket");
                }
                _ => {}
            }
            let listener = UnixListener::bind(&args.listen_addr)
                .with_context(|| format!("failed to bind {}", args.listen_addr))?;
            tracing::info!(socket = %args.listen_addr, "Driver listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await?;
        }
    }

    if let Ok(reason) = reason_rx.await {
        bail!("aborting after unrecoverable driver error: {reason}");
    }

    tracing::info!("Driver stopped");
    Ok(())
}

fn write_spec_file(args: &Args) -> anyhow::Result<()> {
    let Some(dir) = &args.drivers_path else {
        tracing::info!("No drivers path given; not writing a spec file");
        return Ok(());
    };

    let written = if args.transport == Transport::TcpJson {
        let spec = DriverSpec::new(&args.listen_addr, args.unique_volume_ids_enabled());
        spec_file::write_json(dir, &spec)
    } else {
        spec_file::write_plain(dir, &args.listen_addr)
    };
    written
        .with_context(|| format!("failed to write driver spec into {}", dir.display()))
        .map(drop)
}

/// Resolves on Ctrl-C, SIGTERM, or the first unrecoverable driver error.
///
/// In the last case the error message is handed to `reason_tx`.
pub async fn shutdown_signal(
    mut fatal_rx: mpsc::UnboundedReceiver<String>,
    reason_tx: oneshot::Sender<String>,
) {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, shutting down"),
        () = terminate => tracing::info!("Terminated, shutting down"),
        Some(reason) = fatal_rx.recv() => {
            tracing::error!(%reason, "Shutting down after unrecoverable error");
            let _ = reason_tx.send(reason);
        }
    }
}
