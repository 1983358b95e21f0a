// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for facewatch integration tests.
//!
//! Provides mock adapters and fixtures for fast, deterministic tests without
//! a messaging network or an embedding service.
//!
//! # Components
//!
//! - [`MockSession`] - Session client with event injection and send capture
//! - [`MockEmbedder`] - Face embedder returning pre-configured embeddings
//! - [`fixtures`] - Sample images, embeddings and configuration

pub mod fixtures;
pub mod mock_embedder;
pub mod mock_session;

pub use mock_embedder::MockEmbedder;
pub use mock_session::{MockSession, SentMessage};
