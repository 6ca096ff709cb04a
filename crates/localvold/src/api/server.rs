use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use localvol::LocalDriver;
use localvol_common::DriverResult;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::handlers;

/// Shared state of every request handler.
#[derive(Clone)]
pub struct AppState {
    driver: Arc<LocalDriver>,
    fatal: mpsc::UnboundedSender<String>,
}

impl AppState {
    /// Wrap `driver`. The receiver yields the message of every unrecoverable
    /// driver error; the server is expected to shut down on the first one.
    #[must_use]
    pub fn new(driver: Arc<LocalDriver>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (fatal, fatal_rx) = mpsc::unbounded_channel();
        (Self { driver, fatal }, fatal_rx)
    }

    /// Run a driver call on the blocking pool.
    ///
    /// Errors come back as the client-facing message. Unrecoverable errors are
    /// also reported on the fatal channel.
    pub(crate) async fn call<T, Op>(&self, op: Op) -> Result<T, String>
    where
        T: Send + 'static,
        Op: FnOnce(&LocalDriver) -> DriverResult<T> + Send + 'static,
    {
        let driver = Arc::clone(&self.driver);
        match tokio::task::spawn_blocking(move || op(&driver)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                let message = err.to_string();
                if err.is_unrecoverable() {
                    tracing::error!(error = %message, "Unrecoverable driver error");
                    // The receiver only goes away during shutdown.
                    let _ = self.fatal.send(message.clone());
                }
                Err(message)
            }
            Err(join) => {
                tracing::error!(error = %join, "Driver task failed");
                Err(format!("Driver task failed: {join}"))
            }
        }
    }
}

/// Build the plugin router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/Plugin.Activate", post(handlers::activate))
        .route("/VolumeDriver.Capabilities", post(handlers::capabilities))
        .route("/VolumeDriver.Create", post(handlers::create))
        .route("/VolumeDriver.Get", post(handlers::get))
        .route("/VolumeDriver.List", post(handlers::list))
        .route("/VolumeDriver.Mount", post(handlers::mount))
        .route("/VolumeDriver.Path", post(handlers::path))
        .route("/VolumeDriver.Remove", post(handlers::remove))
        .route("/VolumeDriver.Unmount", post(handlers::unmount))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
