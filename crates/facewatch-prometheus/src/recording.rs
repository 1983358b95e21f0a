// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder can collect these metrics.
//! Without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_histogram};

/// Register all metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "facewatch_messages_archived_total",
        "Messages written to the conversation archive"
    );
    describe_counter!("facewatch_media_staged_total", "Images downloaded and staged");
    describe_counter!(
        "facewatch_media_skipped_total",
        "Image downloads skipped by policy"
    );
    describe_counter!(
        "facewatch_match_decisions_total",
        "Staged images processed by the match engine, by outcome"
    );
    describe_counter!("facewatch_dispatch_total", "Outbound sends, by result");
    describe_counter!(
        "facewatch_staged_deleted_total",
        "Staged files removed after processing"
    );
    describe_histogram!(
        "facewatch_match_latency_seconds",
        "Time from staged file pickup to deletion"
    );
}

pub fn record_message_archived(origin: &'static str) {
    metrics::counter!("facewatch_messages_archived_total", "origin" => origin).increment(1);
}

pub fn record_media_staged() {
    metrics::counter!("facewatch_media_staged_total").increment(1);
}

pub fn record_media_skipped(reason: &'static str) {
    metrics::counter!("facewatch_media_skipped_total", "reason" => reason).increment(1);
}

/// Record a match engine outcome (`matched`, `no_match`, `rejected`, `error`).
pub fn record_match_decision(outcome: &'static str) {
    metrics::counter!("facewatch_match_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_dispatch(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("facewatch_dispatch_total", "result" => result).increment(1);
}

pub fn record_staged_deleted() {
    metrics::counter!("facewatch_staged_deleted_total").increment(1);
}

pub fn record_match_latency(seconds: f64) {
    metrics::histogram!("facewatch_match_latency_seconds").record(seconds);
}
