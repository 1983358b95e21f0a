// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SessionClient`] over a protocol sidecar.
//!
//! The sidecar owns pairing, encryption and the device store. Events arrive
//! as JSON text frames on a WebSocket and are forwarded into one channel;
//! everything else is a request to [`SidecarApi`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use facewatch_config::model::SessionConfig;
use facewatch_core::{
    AdapterType, AttachmentHandle, FacewatchError, GroupInfo, HealthStatus, MediaKind,
    OutboundPayload, PluginAdapter, Recipient, SessionClient, SessionEvent, UploadedMedia,
};

use crate::http::SidecarApi;

/// Capacity of the inbound event channel.
const EVENT_BUFFER: usize = 256;

/// Upper bound on sending the close frame during disconnect.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

type EventSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State shared between the session and its event pump.
#[derive(Default)]
struct Shared {
    connected: AtomicBool,
    own_id: RwLock<Option<String>>,
}

impl Shared {
    fn set_own_id(&self, id: Option<String>) {
        if let Ok(mut guard) = self.own_id.write() {
            *guard = id;
        }
    }
}

struct Pump {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

pub struct BridgeSession {
    api: SidecarApi,
    events_url: String,
    shared: Arc<Shared>,
    events: tokio::sync::Mutex<Option<mpsc::Receiver<SessionEvent>>>,
    pump: Mutex<Option<Pump>>,
}

impl BridgeSession {
    pub fn new(config: &SessionConfig) -> Result<Self, FacewatchError> {
        Ok(Self {
            api: SidecarApi::new(
                &config.base_url,
                Duration::from_secs(config.request_timeout_secs),
            )?,
            events_url: config.events_url.clone(),
            shared: Arc::new(Shared::default()),
            events: tokio::sync::Mutex::new(None),
            pump: Mutex::new(None),
        })
    }

    fn pump_running(&self) -> bool {
        self.pump
            .lock()
            .map(|pump| pump.as_ref().is_some_and(|p| !p.task.is_finished()))
            .unwrap_or(false)
    }
}

/// Parses one event frame. Unknown or malformed frames are dropped.
fn decode_event(frame: &str) -> Option<SessionEvent> {
    match serde_json::from_str(frame) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "dropping unrecognized sidecar event");
            None
        }
    }
}

/// Reads event frames until the socket closes or `cancel` fires.
///
/// Forwarding into a full channel never blocks cancellation. The closing
/// [`SessionEvent::Disconnected`] is delivered only if the channel has room.
async fn run_pump(
    socket: EventSocket,
    api: SidecarApi,
    shared: Arc<Shared>,
    tx: mpsc::Sender<SessionEvent>,
    cancel: CancellationToken,
) {
    let (mut sink, mut stream) = socket.split();
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let Some(event) = decode_event(text.as_str()) else { continue };
                    event
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("sidecar closed the event stream");
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "sidecar event stream failed");
                    break;
                }
            }
        };

        match &event {
            SessionEvent::Connected => {
                shared.connected.store(true, Ordering::SeqCst);
                match api.me().await {
                    Ok(id) => shared.set_own_id(Some(id)),
                    Err(e) => warn!(error = %e, "could not resolve own id"),
                }
            }
            SessionEvent::LoggedOut | SessionEvent::Disconnected => {
                shared.connected.store(false, Ordering::SeqCst);
            }
            _ => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = tx.send(event) => if sent.is_err() { break },
        }
    }

    if cancel.is_cancelled() {
        match tokio::time::timeout(CLOSE_TIMEOUT, sink.send(Message::Close(None))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "failed to send close frame"),
            Err(_) => debug!("timed out sending close frame"),
        }
    }
    shared.connected.store(false, Ordering::SeqCst);
    if tx.try_send(SessionEvent::Disconnected).is_err() {
        debug!("event channel full or closed, final disconnect not forwarded");
    }
}

#[async_trait]
impl PluginAdapter for BridgeSession {
    fn name(&self) -> &str {
        "bridge-session"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Session
    }

    async fn health_check(&self) -> Result<HealthStatus, FacewatchError> {
        if self.is_connected() {
            Ok(HealthStatus::Healthy)
        } else if self.pump_running() {
            Ok(HealthStatus::Degraded("waiting for session".into()))
        } else {
            Ok(HealthStatus::Unhealthy("event stream closed".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), FacewatchError> {
        self.disconnect().await
    }
}

#[async_trait]
impl SessionClient for BridgeSession {
    async fn connect(&self) -> Result<(), FacewatchError> {
        if self.pump_running() {
            return Ok(());
        }
        let (socket, _) = tokio_tungstenite::connect_async(self.events_url.as_str())
            .await
            .map_err(|e| FacewatchError::session("failed to open sidecar event stream", e))?;
        info!(url = %self.events_url, "sidecar event stream opened");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        *self.events.lock().await = Some(rx);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_pump(
            socket,
            self.api.clone(),
            Arc::clone(&self.shared),
            tx,
            cancel.clone(),
        ));
        if let Ok(mut pump) = self.pump.lock() {
            *pump = Some(Pump { task, cancel });
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), FacewatchError> {
        let pump = self.pump.lock().ok().and_then(|mut pump| pump.take());
        if let Some(pump) = pump {
            pump.cancel.cancel();
            if let Err(e) = pump.task.await {
                warn!(error = %e, "event pump ended abnormally");
            }
            info!("sidecar session disconnected");
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn next_event(&self) -> Result<Option<SessionEvent>, FacewatchError> {
        let mut events = self.events.lock().await;
        match events.as_mut() {
            Some(rx) => Ok(rx.recv().await),
            None => Err(FacewatchError::NotConnected),
        }
    }

    async fn download(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, FacewatchError> {
        self.api.download(handle).await
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        kind: MediaKind,
    ) -> Result<UploadedMedia, FacewatchError> {
        self.api.upload(&data, &kind).await
    }

    async fn send_message(
        &self,
        to: &Recipient,
        payload: OutboundPayload,
    ) -> Result<String, FacewatchError> {
        self.api.send(to, &payload).await
    }

    async fn joined_groups(&self) -> Result<Vec<GroupInfo>, FacewatchError> {
        self.api.groups().await
    }

    async fn contact_name(&self, chat_id: &str) -> Result<Option<String>, FacewatchError> {
        self.api.contact_name(chat_id).await
    }

    fn own_id(&self) -> Option<String> {
        self.shared.own_id.read().ok().and_then(|id| id.clone())
    }
}
