//! HTTP request handlers
//!
//! `POST /events` is one handler invocation. The response status tells the
//! notifier whether redelivering the same event could succeed.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::error::{HandlerError, StoreError};
use crate::state::{AppState, StatsSnapshot};

/// HTTP error type
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<HandlerError> for HttpError {
    fn from(err: HandlerError) -> Self {
        let status = match &err {
            // The same payload will fail the same way
            HandlerError::EventParse(_)
            | HandlerError::Decode { .. }
            | HandlerError::UnexpectedSuffix { .. } => StatusCode::BAD_REQUEST,
            HandlerError::Retrieval(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            HandlerError::Retrieval(StoreError::InvalidKey(_))
            | HandlerError::Storage(StoreError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            HandlerError::Retrieval(_) | HandlerError::Storage(_) => StatusCode::BAD_GATEWAY,
            HandlerError::Transcode(_) | HandlerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Event endpoint
/// POST /events
pub async fn handle_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<&'static str, HttpError> {
    let invocation = state.stats.begin();
    let result = state.handler.handle_payload(&body).await;
    invocation.finish(result.is_ok());
    result.map_err(HttpError::from)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, serde::Serialize)]
pub struct StatsResponse {
    pub uptime_secs: u64,
    pub bitrate: String,
    pub source_suffix: String,
    pub target_suffix: String,
    pub invocations: StatsSnapshot,
}

/// Invocation counters
/// GET /debug/stats
pub async fn invocation_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let transcode = &state.config.transcode;
    Json(StatsResponse {
        uptime_secs: state.uptime_secs(),
        bitrate: transcode.bitrate.clone(),
        source_suffix: transcode.source_suffix.clone(),
        target_suffix: transcode.target_suffix.clone(),
        invocations: state.stats.snapshot(),
    })
}
