// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across facewatch crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Address suffix marking a group chat.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Address suffix marking an individual contact.
pub const CONTACT_SUFFIX: &str = "@s.whatsapp.net";

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Session,
    Storage,
    Embedding,
}

// --- Archive types ---

/// A conversation known to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Opaque chat identifier (group or contact address).
    pub id: String,
    /// Display name, or the raw identifier when no name is known.
    pub name: String,
    /// Timestamp of the most recent message seen in this chat.
    pub last_message_at: DateTime<Utc>,
}

/// A message row in the archive, keyed by `(id, chat_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedMessage {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    /// Text content; empty for media-only messages.
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_from_me: bool,
    /// Path of the staged media file, if one was acquired.
    pub media_path: Option<String>,
    pub thumbnail: Option<Vec<u8>>,
    pub media_kind: Option<MediaKind>,
}

impl ArchivedMessage {
    /// Whether this message carries anything worth persisting.
    ///
    /// Control messages (reactions, receipts, protocol frames) carry neither
    /// text nor media and are never archived.
    pub fn has_payload(&self) -> bool {
        !self.content.is_empty() || self.media_path.is_some()
    }
}

/// Literal media kind tag stored with messages and carried by send requests.
///
/// Unknown tags are preserved verbatim in [`MediaKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaKind {
    Image,
    Video,
    Other(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MediaKind {
    fn from(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Other(tag.to_string()),
        }
    }
}

impl From<String> for MediaKind {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<MediaKind> for String {
    fn from(kind: MediaKind) -> Self {
        kind.as_str().to_string()
    }
}

// --- Session event types ---

/// Opaque reference to a downloadable attachment.
///
/// Only the session client understands its contents; the core passes it
/// back unchanged when requesting a download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentHandle(pub serde_json::Value);

/// An image attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttachment {
    pub handle: AttachmentHandle,
    #[serde(default)]
    pub caption: Option<String>,
    /// Embedded low-resolution JPEG preview, if the sender supplied one.
    #[serde(default)]
    pub jpeg_thumbnail: Option<Vec<u8>>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Content of an inbound message as delivered by the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Plain text body.
    #[serde(default)]
    pub conversation: Option<String>,
    /// Text body of a message carrying a quote or link preview.
    #[serde(default)]
    pub extended_text: Option<String>,
    #[serde(default)]
    pub image: Option<ImageAttachment>,
}

impl MessageBody {
    /// Extracts the text content: plain text first, then extended text, then
    /// the image caption. Returns an empty string when none is present.
    pub fn text(&self) -> String {
        [
            self.conversation.as_deref(),
            self.extended_text.as_deref(),
            self.image.as_ref().and_then(|img| img.caption.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
    }
}

/// A single message delivered in real time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMessage {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub is_from_me: bool,
    pub timestamp: DateTime<Utc>,
    pub body: MessageBody,
}

/// A historical message inside a backlog conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogMessage {
    pub id: String,
    pub from_me: bool,
    /// Sender within a group conversation; absent in one-to-one chats.
    #[serde(default)]
    pub participant: Option<String>,
    /// Unix seconds; zero means the session did not provide a timestamp.
    pub timestamp: i64,
    pub body: MessageBody,
}

/// One conversation of a backlog sync, messages in delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogConversation {
    pub chat_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub messages: Vec<BacklogMessage>,
}

/// A bulk delivery of historical conversations after (re)connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacklogBatch {
    pub conversations: Vec<BacklogConversation>,
}

/// Events emitted by the messaging session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    LiveMessage(LiveMessage),
    BacklogSync(BacklogBatch),
    /// A pairing code to be shown to the operator as a QR code.
    PairingCode(String),
    Connected,
    LoggedOut,
    Disconnected,
}

/// A group the operator's account has joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
}

// --- Outbound types ---

/// Result of uploading media through the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Opaque upload reference understood by the session client.
    pub handle: serde_json::Value,
    pub file_length: u64,
}

/// Resolved delivery address for an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recipient {
    Group(String),
    Contact(String),
}

impl Recipient {
    /// Parses a destination address.
    ///
    /// A trailing [`GROUP_SUFFIX`] selects a group chat; anything else is an
    /// individual contact, with an optional [`CONTACT_SUFFIX`] accepted.
    pub fn parse(destination: &str) -> Option<Self> {
        let destination = destination.trim();
        if let Some(user) = destination.strip_suffix(GROUP_SUFFIX) {
            return (!user.is_empty()).then(|| Self::Group(user.to_string()));
        }
        let user = destination
            .strip_suffix(CONTACT_SUFFIX)
            .unwrap_or(destination);
        (!user.is_empty()).then(|| Self::Contact(user.to_string()))
    }

    /// Fully qualified address understood by the session.
    pub fn address(&self) -> String {
        match self {
            Self::Group(user) => format!("{user}{GROUP_SUFFIX}"),
            Self::Contact(user) => format!("{user}{CONTACT_SUFFIX}"),
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Protocol payload handed to the session for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundPayload {
    Text {
        body: String,
    },
    Image {
        upload: UploadedMedia,
        caption: Option<String>,
        mimetype: String,
        width: u32,
        height: u32,
    },
    Video {
        upload: UploadedMedia,
        caption: Option<String>,
        mimetype: String,
    },
}

// --- Embedding types ---

/// A face embedding vector produced by the embedding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceEmbedding(pub Vec<f32>);

impl FaceEmbedding {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(caption: Option<&str>) -> ImageAttachment {
        ImageAttachment {
            handle: AttachmentHandle(serde_json::json!({"direct_path": "/v/t62"})),
            caption: caption.map(str::to_string),
            jpeg_thumbnail: None,
            mimetype: Some("image/jpeg".into()),
        }
    }

    #[test]
    fn text_prefers_plain_conversation() {
        let body = MessageBody {
            conversation: Some("hello".into()),
            extended_text: Some("extended".into()),
            image: Some(image(Some("caption"))),
        };
        assert_eq!(body.text(), "hello");
    }

    #[test]
    fn text_falls_back_to_extended_then_caption() {
        let body = MessageBody {
            conversation: None,
            extended_text: Some("see link".into()),
            image: None,
        };
        assert_eq!(body.text(), "see link");

        let body = MessageBody {
            conversation: Some(String::new()),
            extended_text: None,
            image: Some(image(Some("at the park"))),
        };
        assert_eq!(body.text(), "at the park");
    }

    #[test]
    fn text_is_empty_for_control_messages() {
        assert_eq!(MessageBody::default().text(), "");
        let body = MessageBody {
            image: Some(image(None)),
            ..Default::default()
        };
        assert_eq!(body.text(), "");
    }

    #[test]
    fn media_kind_parses_known_and_unknown_tags() {
        assert_eq!(MediaKind::from("image"), MediaKind::Image);
        assert_eq!(MediaKind::from("VIDEO"), MediaKind::Video);
        assert_eq!(
            MediaKind::from("document"),
            MediaKind::Other("document".into())
        );
        assert_eq!(MediaKind::Image.to_string(), "image");
    }

    #[test]
    fn media_kind_serializes_as_plain_string() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
        let parsed: MediaKind = serde_json::from_str("\"audio\"").unwrap();
        assert_eq!(parsed, MediaKind::Other("audio".into()));
    }

    #[test]
    fn recipient_group_suffix_selects_group() {
        let r = Recipient::parse("120363012345@g.us").unwrap();
        assert_eq!(r, Recipient::Group("120363012345".into()));
        assert_eq!(r.address(), "120363012345@g.us");
    }

    #[test]
    fn recipient_defaults_to_contact() {
        assert_eq!(
            Recipient::parse("15551234567").unwrap(),
            Recipient::Contact("15551234567".into())
        );
        assert_eq!(
            Recipient::parse("15551234567@s.whatsapp.net")
                .unwrap()
                .address(),
            "15551234567@s.whatsapp.net"
        );
    }

    #[test]
    fn recipient_rejects_empty_addresses() {
        assert!(Recipient::parse("").is_none());
        assert!(Recipient::parse("   ").is_none());
        assert!(Recipient::parse("@g.us").is_none());
    }

    #[test]
    fn archived_message_payload_rule() {
        let mut msg = ArchivedMessage {
            id: "m1".into(),
            chat_id: "c1".into(),
            sender: "s".into(),
            content: String::new(),
            timestamp: Utc::now(),
            is_from_me: false,
            media_path: None,
            thumbnail: None,
            media_kind: None,
        };
        assert!(!msg.has_payload());
        msg.media_path = Some("store/media/img_1.jpg".into());
        assert!(msg.has_payload());
        msg.media_path = None;
        msg.content = "hi".into();
        assert!(msg.has_payload());
    }

    #[test]
    fn session_event_wire_shape() {
        let json = r#"{"type":"backlog_sync","data":{"conversations":[
            {"chat_id":"g1@g.us","messages":[
                {"id":"a","from_me":false,"participant":"p@s.whatsapp.net","timestamp":1700000000,
                 "body":{"conversation":"hi"}}]}]}}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();
        match event {
            SessionEvent::BacklogSync(batch) => {
                assert_eq!(batch.conversations.len(), 1);
                assert_eq!(batch.conversations[0].messages[0].body.text(), "hi");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let connected: SessionEvent = serde_json::from_str(r#"{"type":"connected"}"#).unwrap();
        assert_eq!(connected, SessionEvent::Connected);
    }

    proptest::proptest! {
        #[test]
        fn recipient_address_round_trips(user in "[0-9]{5,15}") {
            let group = Recipient::parse(&format!("{user}@g.us")).unwrap();
            proptest::prop_assert_eq!(Recipient::parse(&group.address()).unwrap(), group);
            let contact = Recipient::parse(&user).unwrap();
            proptest::prop_assert_eq!(Recipient::parse(&contact.address()).unwrap(), contact);
        }
    }
}
