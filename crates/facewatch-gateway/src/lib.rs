// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound dispatch gateway for facewatch.
//!
//! [`DispatchGateway`] validates a send request, normalizes image media to
//! JPEG, uploads it through the session and sends the resulting message. It
//! is shared by the match engine and the HTTP command surface, and has no
//! knowledge of why a send was requested.

pub mod client;
pub mod dispatch;
pub mod handlers;
pub mod server;
pub mod transcode;

pub use client::CommandClient;
pub use dispatch::{DispatchGateway, SendOutcome, SendRequest};
pub use server::{GatewayState, HealthState, bind, router, serve};
