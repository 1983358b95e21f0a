// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging session for facewatch.
//!
//! [`BridgeSession`] is the production [`facewatch_core::SessionClient`]. It
//! delegates the messaging protocol to a sidecar process reached over a
//! WebSocket event stream and a JSON HTTP API.

pub mod http;
pub mod session;

pub use http::SidecarApi;
pub use session::BridgeSession;
