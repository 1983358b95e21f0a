// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the command surface.
//!
//! Handles POST /api/send, GET /health, GET /metrics.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use facewatch_core::{FacewatchError, MediaKind};

use crate::dispatch::{SendOutcome, SendRequest};
use crate::server::GatewayState;

/// Request body for POST /api/send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    /// Destination address: a group id ending in `@g.us` or a phone number.
    pub phone: String,
    pub message: String,
    /// Local path of the media file to send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// `image` or `video`; anything else sends `message` as text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl SendMessageRequest {
    fn into_send_request(self) -> SendRequest {
        SendRequest {
            destination: self.phone,
            text: self.message,
            media_path: self.media_url.filter(|u| !u.is_empty()).map(Into::into),
            media_kind: self
                .media_type
                .filter(|t| !t.is_empty())
                .map(|t| MediaKind::from(t.as_str())),
            caption: self.caption,
        }
    }
}

/// Response body for POST /api/send.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: String,
}

impl From<SendOutcome> for SendMessageResponse {
    fn from(outcome: SendOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.detail,
        }
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when connected, `degraded` otherwise.
    pub status: String,
    pub connected: bool,
    pub version: String,
    pub uptime_secs: u64,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(SendMessageResponse {
            success: false,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /api/send
///
/// The body is parsed by hand so that any malformed or mistyped body is a
/// 400 regardless of content type.
pub async fn post_send(State(state): State<GatewayState>, body: Bytes) -> Response {
    let request: SendMessageRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "failed to parse send request");
            return bad_request("Invalid request format");
        }
    };
    debug!(
        phone = %request.phone,
        has_media = request.media_url.as_deref().is_some_and(|u| !u.is_empty()),
        media_type = request.media_type.as_deref().unwrap_or(""),
        "received send request"
    );

    if request.phone.is_empty()
        || (request.message.is_empty() && request.media_url.as_deref().unwrap_or("").is_empty())
    {
        return bad_request("Phone and either message or media URL are required");
    }

    let send = request.into_send_request();
    let outcome = match tokio::time::timeout(state.send_timeout, state.gateway.send(&send)).await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            facewatch_prometheus::record_dispatch(false);
            SendOutcome::failure(&FacewatchError::Timeout {
                duration: state.send_timeout,
            })
        }
    };

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(SendMessageResponse::from(outcome))).into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let connected = state.gateway.is_connected();
    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" }.to_string(),
        connected,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}
