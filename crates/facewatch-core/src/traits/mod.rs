// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod archive;
pub mod embedding;
pub mod session;

pub use adapter::PluginAdapter;
pub use archive::ArchiveAdapter;
pub use embedding::FaceEmbedder;
pub use session::SessionClient;
