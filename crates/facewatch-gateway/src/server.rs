// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command surface HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use facewatch_core::FacewatchError;

use crate::dispatch::DispatchGateway;
use crate::handlers;

/// Health state for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Arc<DispatchGateway>,
    /// Upper bound for a single send, including transcoding and upload.
    pub send_timeout: Duration,
    pub health: HealthState,
}

/// Builds the command surface routes. There is no CORS layer, so browsers
/// refuse cross-origin calls.
///
/// - POST /api/send
/// - GET /health
/// - GET /metrics
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/send", post(handlers::post_send))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves the command surface on `listener` until `cancel` fires.
///
/// In-flight requests are allowed to finish after cancellation.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), FacewatchError> {
    let addr = listener
        .local_addr()
        .map_err(|e| FacewatchError::dispatch("failed to resolve gateway address", e))?;
    tracing::info!(%addr, "gateway server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| FacewatchError::dispatch("gateway server error", e))?;

    tracing::info!("gateway server stopped");
    Ok(())
}

/// Binds the listen address for the command surface.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, FacewatchError> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|e| FacewatchError::dispatch(format!("failed to bind gateway to {addr}"), e))
}
