// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging session trait.

use async_trait::async_trait;

use crate::error::FacewatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AttachmentHandle, GroupInfo, MediaKind, OutboundPayload, Recipient, SessionEvent,
    UploadedMedia,
};

/// Long-lived connection to the messaging network.
///
/// Pairing, encryption and transport live behind this boundary. The core
/// only consumes the event stream and issues download, upload and send
/// calls. All methods take `&self`; implementations use interior
/// mutability so one client can be shared between the event router and the
/// dispatch gateway.
#[async_trait]
pub trait SessionClient: PluginAdapter {
    /// Opens the connection. Pairing, if required, is reported through
    /// [`SessionEvent::PairingCode`] events.
    async fn connect(&self) -> Result<(), FacewatchError>;

    /// Closes the connection.
    async fn disconnect(&self) -> Result<(), FacewatchError>;

    /// Whether the session is currently connected.
    fn is_connected(&self) -> bool;

    /// Waits for the next inbound event. Returns `None` once the event
    /// stream has ended.
    async fn next_event(&self) -> Result<Option<SessionEvent>, FacewatchError>;

    /// Downloads and decrypts an attachment.
    async fn download(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, FacewatchError>;

    /// Uploads media for a later send.
    async fn upload(&self, data: Vec<u8>, kind: MediaKind)
    -> Result<UploadedMedia, FacewatchError>;

    /// Sends a message and returns the protocol message id.
    async fn send_message(
        &self,
        to: &Recipient,
        payload: OutboundPayload,
    ) -> Result<String, FacewatchError>;

    /// Lists the groups the operator's account has joined.
    async fn joined_groups(&self) -> Result<Vec<GroupInfo>, FacewatchError>;

    /// Resolves a display name for a chat (contact or group), if known.
    async fn contact_name(&self, chat_id: &str) -> Result<Option<String>, FacewatchError>;

    /// The operator's own user identifier, once paired.
    fn own_id(&self) -> Option<String>;
}
