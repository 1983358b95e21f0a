// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for facewatch.
//!
//! This crate provides the trait definitions, error type, and domain types
//! shared by the archive, the event router, the match engine, and the
//! dispatch gateway. Collaborators outside the process (the messaging
//! session and the face embedding service) are consumed through the traits
//! defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::FacewatchError;
pub use types::{
    AdapterType, ArchivedMessage, AttachmentHandle, BacklogBatch, BacklogConversation,
    BacklogMessage, Chat, FaceEmbedding, GroupInfo, HealthStatus, ImageAttachment, LiveMessage,
    MediaKind, MessageBody, OutboundPayload, Recipient, SessionEvent, UploadedMedia,
};

pub use traits::{ArchiveAdapter, FaceEmbedder, PluginAdapter, SessionClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facewatch_error_has_all_variants() {
        let _config = FacewatchError::Config("test".into());
        let _storage = FacewatchError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _session = FacewatchError::Session {
            message: "test".into(),
            source: None,
        };
        let _media = FacewatchError::Media {
            message: "test".into(),
            source: None,
        };
        let _embedding = FacewatchError::Embedding {
            message: "test".into(),
            source: None,
        };
        let _dispatch = FacewatchError::Dispatch {
            message: "test".into(),
            source: None,
        };
        let _validation = FacewatchError::Validation("test".into());
        let _not_connected = FacewatchError::NotConnected;
        let _timeout = FacewatchError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = FacewatchError::Internal("test".into());
    }

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Session,
            AdapterType::Storage,
            AdapterType::Embedding,
        ] {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_session_client<T: SessionClient>() {}
        fn _assert_face_embedder<T: FaceEmbedder>() {}
        fn _assert_archive_adapter<T: ArchiveAdapter>() {}
    }
}
