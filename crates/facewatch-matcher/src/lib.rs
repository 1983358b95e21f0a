// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity matching for facewatch.
//!
//! Reference photos are embedded once at startup (and again on reload) into
//! an [`IdentityRegistry`]. The [`MatchEngine`] consumes staged images,
//! embeds the faces they contain and notifies every identity that reaches
//! quorum.

pub mod embedder;
pub mod engine;
pub mod quorum;
pub mod references;
pub mod registry;

pub use embedder::HttpFaceEmbedder;
pub use engine::{Dispatch, MatchEngine, MatchOutcome, MatchReport};
pub use quorum::{Identity, IdentityMatch, MatchPolicy, ReferencePhoto};
pub use references::load_identities;
pub use registry::IdentityRegistry;
