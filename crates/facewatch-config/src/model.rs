// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level facewatch configuration, loaded from `config.json`.
///
/// Every section is optional and defaults to sensible values, except that a
/// deployment without `input_groups` and `destinations` never matches
/// anything.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FacewatchConfig {
    /// Chat identifiers whose inbound images are eligible for matching.
    #[serde(default)]
    pub input_groups: Vec<String>,

    /// Identities of interest keyed by reference directory name.
    #[serde(default)]
    pub destinations: BTreeMap<String, DestinationConfig>,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub face_detection: FaceDetectionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub embedder: EmbedderConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub debug: DebugConfig,
}

impl FacewatchConfig {
    /// Reference image directory for an identity key.
    pub fn reference_dir(&self, identity_key: &str) -> PathBuf {
        Path::new(&self.face_detection.known_faces_dir).join(identity_key)
    }
}

/// Where and how to notify about one identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    /// Display name, used as the notification caption.
    pub name: String,
    /// Destination address: a group (`...@g.us`) or a contact.
    pub group: String,
}

/// Media staging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// File extensions eligible for matching, with or without a leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Staging directory for downloaded images.
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Live images older than this many seconds are not downloaded.
    #[serde(default = "default_live_recency_secs")]
    pub live_recency_secs: u64,
}

impl MediaConfig {
    /// Whether `path` has one of the allowed extensions (case-insensitive).
    pub fn is_allowed(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            store_path: default_store_path(),
            live_recency_secs: default_live_recency_secs(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".jpg".into(), ".jpeg".into(), ".png".into()]
}

fn default_store_path() -> String {
    "store/media".to_string()
}

fn default_live_recency_secs() -> u64 {
    300
}

/// Face matching policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FaceDetectionConfig {
    /// Root of the reference tree: one subdirectory per identity key.
    #[serde(default = "default_known_faces_dir")]
    pub known_faces_dir: String,

    /// Maximum embedding distance counted as a match (lower is stricter).
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Detection model hint forwarded to the embedding service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Number of distinct reference photos that must agree.
    #[serde(default = "default_min_matching_faces")]
    pub min_matching_faces: usize,

    /// Staged images processed concurrently.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            known_faces_dir: default_known_faces_dir(),
            confidence_threshold: default_confidence_threshold(),
            model: default_model(),
            min_matching_faces: default_min_matching_faces(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_known_faces_dir() -> String {
    "known_faces".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.6
}

fn default_model() -> String {
    "hog".to_string()
}

fn default_min_matching_faces() -> usize {
    2
}

fn default_max_concurrent() -> usize {
    2
}

/// Conversation archive configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_archive_path")]
    pub archive_path: String,

    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            archive_path: default_archive_path(),
            wal_mode: true,
        }
    }
}

fn default_archive_path() -> String {
    "store/messages.db".to_string()
}

fn default_true() -> bool {
    true
}

/// Messaging session sidecar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// HTTP base URL of the protocol sidecar.
    #[serde(default = "default_session_base_url")]
    pub base_url: String,

    /// WebSocket URL streaming session events.
    #[serde(default = "default_session_events_url")]
    pub events_url: String,

    /// How long to wait for the operator to scan a pairing code.
    #[serde(default = "default_pairing_timeout_secs")]
    pub pairing_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: default_session_base_url(),
            events_url: default_session_events_url(),
            pairing_timeout_secs: default_pairing_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_session_base_url() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_session_events_url() -> String {
    "ws://127.0.0.1:9090/events".to_string()
}

fn default_pairing_timeout_secs() -> u64 {
    180
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Face embedding service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedderConfig {
    #[serde(default = "default_embedder_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedder_endpoint(),
            timeout_secs: default_embedder_timeout_secs(),
        }
    }
}

fn default_embedder_endpoint() -> String {
    "http://127.0.0.1:5001/embed".to_string()
}

fn default_embedder_timeout_secs() -> u64 {
    30
}

/// Command surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listen address. Loopback by default; the surface has no authentication.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Upper bound on a single send, including transcoding and upload.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_send_timeout_secs() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Debug image retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_debug_output_dir")]
    pub output_dir: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: default_debug_output_dir(),
        }
    }
}

fn default_debug_output_dir() -> String {
    "debug_output".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = FacewatchConfig::default();
        assert_eq!(config.media.store_path, "store/media");
        assert_eq!(config.media.live_recency_secs, 300);
        assert_eq!(config.face_detection.min_matching_faces, 2);
        assert_eq!(config.face_detection.model, "hog");
        assert_eq!(config.session.pairing_timeout_secs, 180);
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert!(!config.debug.enabled);
    }

    #[test]
    fn allowed_extensions_ignore_dot_and_case() {
        let media = MediaConfig::default();
        assert!(media.is_allowed(Path::new("store/media/img_1.jpg")));
        assert!(media.is_allowed(Path::new("IMG.JPEG")));
        assert!(!media.is_allowed(Path::new("clip.mp4")));
        assert!(!media.is_allowed(Path::new("img_1.jpg.part")));
        assert!(!media.is_allowed(Path::new("noext")));

        let media = MediaConfig {
            allowed_extensions: vec!["png".into()],
            ..MediaConfig::default()
        };
        assert!(media.is_allowed(Path::new("a.PNG")));
    }

    #[test]
    fn destination_requires_name_and_group() {
        let result = serde_json::from_str::<DestinationConfig>(r#"{"name":"Ann"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn reference_dir_joins_identity_key() {
        let mut config = FacewatchConfig::default();
        config.face_detection.known_faces_dir = "/srv/faces".into();
        assert_eq!(config.reference_dir("ann"), PathBuf::from("/srv/faces/ann"));
    }
}
