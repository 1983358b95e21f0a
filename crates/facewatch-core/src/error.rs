// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for facewatch.

use thiserror::Error;

/// The primary error type used across all facewatch traits and operations.
#[derive(Debug, Error)]
pub enum FacewatchError {
    /// Configuration errors (malformed JSON, missing reference directories).
    #[error("configuration error: {0}")]
    Config(String),

    /// Archive errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging session errors (connect, download, upload, event stream).
    #[error("session error: {message}")]
    Session {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Staging errors (file writes, directory creation, watcher setup).
    #[error("media error: {message}")]
    Media {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Face embedding service errors.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Outbound send errors (transcoding, upload, send).
    #[error("dispatch error: {message}")]
    Dispatch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A request failed precondition checks.
    #[error("validation error: {0}")]
    Validation(String),

    /// The messaging session is not connected.
    #[error("not connected to messaging network")]
    NotConnected,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FacewatchError {
    /// Builds a [`FacewatchError::Session`] from a message and an underlying error.
    pub fn session(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Session {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a [`FacewatchError::Media`] from a message and an underlying error.
    pub fn media(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Media {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Builds a [`FacewatchError::Dispatch`] from a message and an underlying error.
    pub fn dispatch(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Dispatch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Renders the error together with its underlying cause, if any.
    ///
    /// Used for human-readable detail strings returned to callers of the
    /// command surface.
    pub fn detail(&self) -> String {
        let cause = match self {
            Self::Session { source, .. }
            | Self::Media { source, .. }
            | Self::Embedding { source, .. }
            | Self::Dispatch { source, .. } => source.as_ref().map(|s| s.to_string()),
            _ => None,
        };
        match cause {
            Some(cause) => format!("{self}: {cause}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_includes_underlying_cause() {
        let err =
            FacewatchError::dispatch("error uploading image", std::io::Error::other("quota"));
        assert_eq!(err.detail(), "dispatch error: error uploading image: quota");
    }

    #[test]
    fn detail_without_cause_is_display() {
        let err = FacewatchError::NotConnected;
        assert_eq!(err.detail(), "not connected to messaging network");
    }
}
