// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for facewatch.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Pipeline crates
//! call the [`recording`] helpers; the command surface serves
//! [`PrometheusExporter::render`] on `/metrics`.

pub mod recording;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use facewatch_core::FacewatchError;

pub use recording::{
    record_dispatch, record_match_decision, record_match_latency, record_media_skipped,
    record_media_staged, record_message_archived, record_staged_deleted,
};

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn install() -> Result<Self, FacewatchError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            FacewatchError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
