// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media acquisition for facewatch.
//!
//! Downloads image attachments through the session, stages them on disk
//! under a per-chat directory, and exposes newly staged files as a stream
//! for the match engine.

pub mod pipeline;
pub mod staging;
pub mod watcher;

pub use pipeline::{Acquired, MediaPipeline, Origin, SkipReason, StagedMedia};
pub use staging::{chat_key, sweep_staging};
pub use watcher::{StagedPath, StagingStream, StagingWatcher};
