// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facewatch: watches messaging groups for known faces and forwards
//! matching photos to per-person destinations.
//!
//! The binary in `main.rs` parses the command line and dispatches to
//! [`serve::run_serve`], [`groups::run_list_groups`] or [`send::run_send`].

pub mod groups;
pub mod send;
pub mod serve;
