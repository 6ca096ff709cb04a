//! Endpoint handlers.
//!
//! Bodies are decoded by hand so that clients sending an empty body or a
//! plugin-specific content type are still understood.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::server::AppState;
use super::types::{
    ActivateResponse, CapabilitiesResponse, CapabilityInfo, CreateRequest, ErrorResponse,
    GetResponse, ListResponse, MountRequest, MountResponse, NamedRequest, WireVolume,
};

fn reply<T: Serialize>(failed: bool, body: T) -> Response {
    let status = if failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(body)).into_response()
}

fn decode<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "Rejecting malformed request body");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                err: format!("Invalid request body: {e}"),
            }),
        )
            .into_response()
    })
}

fn outcome(result: Result<(), String>) -> Response {
    match result {
        Ok(()) => reply(false, ErrorResponse::default()),
        Err(err) => reply(true, ErrorResponse { err }),
    }
}

pub(super) async fn activate() -> Json<ActivateResponse> {
    Json(ActivateResponse {
        implements: vec!["VolumeDriver".to_string()],
    })
}

pub(super) async fn capabilities() -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        capabilities: CapabilityInfo {
            scope: "local".to_string(),
        },
    })
}

pub(super) async fn create(State(state): State<AppState>, body: Bytes) -> Response {
    let req: CreateRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    tracing::debug!(volume = %req.name, opts = ?req.opts, "Create requested");

    outcome(state.call(move |driver| driver.create(&req.name)).await)
}

pub(super) async fn mount(State(state): State<AppState>, body: Bytes) -> Response {
    let req: MountRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    tracing::debug!(volume = %req.name, id = %req.id, "Mount requested");

    match state.call(move |driver| driver.mount(&req.name)).await {
        Ok(mountpoint) => reply(
            false,
            MountResponse {
                mountpoint: mountpoint.display().to_string(),
                err: String::new(),
            },
        ),
        Err(err) => reply(
            true,
            MountResponse {
                mountpoint: String::new(),
                err,
            },
        ),
    }
}

pub(super) async fn unmount(State(state): State<AppState>, body: Bytes) -> Response {
    let req: MountRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };
    tracing::debug!(volume = %req.name, id = %req.id, "Unmount requested");

    outcome(state.call(move |driver| driver.unmount(&req.name)).await)
}

pub(super) async fn path(State(state): State<AppState>, body: Bytes) -> Response {
    let req: NamedRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    match state.call(move |driver| driver.path(&req.name)).await {
        Ok(mountpoint) => reply(
            false,
            MountResponse {
                mountpoint: mountpoint.display().to_string(),
                err: String::new(),
            },
        ),
        Err(err) => reply(
            true,
            MountResponse {
                mountpoint: String::new(),
                err,
            },
        ),
    }
}

pub(super) async fn get(State(state): State<AppState>, body: Bytes) -> Response {
    let req: NamedRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    match state.call(move |driver| driver.get(&req.name)).await {
        Ok(info) => reply(
            false,
            GetResponse {
                volume: info.into(),
                err: String::new(),
            },
        ),
        Err(err) => reply(
            true,
            GetResponse {
                volume: WireVolume::default(),
                err,
            },
        ),
    }
}

pub(super) async fn list(State(state): State<AppState>) -> Response {
    match state.call(|driver| Ok(driver.list())).await {
        Ok(volumes) => reply(
            false,
            ListResponse {
                volumes: volumes.into_iter().map(WireVolume::from).collect(),
                err: String::new(),
            },
        ),
        Err(err) => reply(
            true,
            ListResponse {
                volumes: Vec::new(),
                err,
            },
        ),
    }
}

pub(super) async fn remove(State(state): State<AppState>, body: Bytes) -> Response {
    let req: NamedRequest = match decode(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    outcome(state.call(move |driver| driver.remove(&req.name)).await)
}
