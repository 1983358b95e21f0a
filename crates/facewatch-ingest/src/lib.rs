// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event routing for facewatch.
//!
//! The [`EventRouter`] consumes session events one at a time: live messages
//! and backlog syncs become archive writes (staging any image attachment
//! on the way), while lifecycle events update the published
//! [`ConnectionState`].

pub mod connection;
pub mod router;
pub mod shutdown;

pub use connection::{ConnectionState, connection_channel, render_pairing_code, wait_for_connected};
pub use router::{BacklogSummary, EventRouter};
pub use shutdown::{install_reload_handler, install_signal_handler};
