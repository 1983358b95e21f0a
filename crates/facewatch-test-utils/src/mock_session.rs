// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock session client for deterministic testing.
//!
//! `MockSession` implements `SessionClient` with injectable inbound events,
//! registered attachments, and captured uploads and sends.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use facewatch_core::{
    AdapterType, AttachmentHandle, FacewatchError, GroupInfo, HealthStatus, MediaKind,
    OutboundPayload, PluginAdapter, Recipient, SessionClient, SessionEvent, UploadedMedia,
};

/// A message captured by [`MockSession::send_message`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: Recipient,
    pub payload: OutboundPayload,
}

/// A mock messaging session for testing.
///
/// - **events**: injected via `inject_event()`, returned by `next_event()`
/// - **attachments**: registered via `attach()`, returned by `download()`
/// - **uploads** and **sent**: captured for assertions
pub struct MockSession {
    events: Mutex<VecDeque<SessionEvent>>,
    notify: Notify,
    closed: AtomicBool,
    connected: AtomicBool,
    attachments: Mutex<HashMap<String, Vec<u8>>>,
    downloads: AtomicUsize,
    uploads: Mutex<Vec<(MediaKind, Vec<u8>)>>,
    sent: Mutex<Vec<SentMessage>>,
    fail_uploads: AtomicBool,
    fail_sends: AtomicBool,
    groups: Vec<GroupInfo>,
    contacts: HashMap<String, String>,
    own_id: Option<String>,
}

impl MockSession {
    /// Create a connected mock session with empty queues.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            connected: AtomicBool::new(true),
            attachments: Mutex::new(HashMap::new()),
            downloads: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            groups: Vec::new(),
            contacts: HashMap::new(),
            own_id: Some("15550000000".to_string()),
        }
    }

    pub fn with_groups(mut self, groups: Vec<GroupInfo>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_contact(mut self, chat_id: &str, name: &str) -> Self {
        self.contacts.insert(chat_id.to_string(), name.to_string());
        self
    }

    pub fn with_own_id(mut self, own_id: Option<&str>) -> Self {
        self.own_id = own_id.map(str::to_string);
        self
    }

    /// Inject an event; the next call to `next_event()` returns it.
    pub async fn inject_event(&self, event: SessionEvent) {
        self.events.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// End the event stream once the queue drains.
    pub fn close_events(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Register attachment bytes and return a handle that downloads them.
    pub async fn attach(&self, id: &str, data: Vec<u8>) -> AttachmentHandle {
        self.attachments.lock().await.insert(id.to_string(), data);
        AttachmentHandle(serde_json::json!({ "id": id }))
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub async fn uploads(&self) -> Vec<(MediaKind, Vec<u8>)> {
        self.uploads.lock().await.clone()
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_err(message: &str) -> FacewatchError {
    FacewatchError::Session {
        message: message.to_string(),
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for MockSession {
    fn name(&self) -> &str {
        "mock-session"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Session
    }

    async fn health_check(&self) -> Result<HealthStatus, FacewatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FacewatchError> {
        Ok(())
    }
}

#[async_trait]
impl SessionClient for MockSession {
    async fn connect(&self) -> Result<(), FacewatchError> {
        self.connected.store(true, Ordering::SeqCst);
        self.inject_event(SessionEvent::Connected).await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), FacewatchError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn next_event(&self) -> Result<Option<SessionEvent>, FacewatchError> {
        loop {
            {
                let mut queue = self.events.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(Some(event));
                }
                if self.closed.load(Ordering::SeqCst) {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn download(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, FacewatchError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let id = handle
            .0
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| mock_err("attachment handle has no id"))?;
        self.attachments
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| mock_err("attachment not found"))
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        kind: MediaKind,
    ) -> Result<UploadedMedia, FacewatchError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(mock_err("upload rejected"));
        }
        let mut uploads = self.uploads.lock().await;
        let file_length = data.len() as u64;
        uploads.push((kind, data));
        Ok(UploadedMedia {
            handle: serde_json::json!({ "upload": uploads.len() }),
            file_length,
        })
    }

    async fn send_message(
        &self,
        to: &Recipient,
        payload: OutboundPayload,
    ) -> Result<String, FacewatchError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(mock_err("send rejected"));
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentMessage {
            to: to.clone(),
            payload,
        });
        Ok(format!("mock-msg-{}", sent.len()))
    }

    async fn joined_groups(&self) -> Result<Vec<GroupInfo>, FacewatchError> {
        Ok(self.groups.clone())
    }

    async fn contact_name(&self, chat_id: &str) -> Result<Option<String>, FacewatchError> {
        Ok(self.contacts.get(chat_id).cloned())
    }

    fn own_id(&self) -> Option<String> {
        self.own_id.clone()
    }
}
