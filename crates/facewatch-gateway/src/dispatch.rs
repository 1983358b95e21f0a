// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound dispatch: validate, transcode, upload, send.
//!
//! The gateway does not retry. A failed upload or send is reported once as
//! a [`SendOutcome`] carrying the underlying cause.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use facewatch_core::{FacewatchError, MediaKind, OutboundPayload, Recipient, SessionClient};

use crate::transcode;

/// One outbound send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendRequest {
    /// Group (`...@g.us`) or contact address.
    pub destination: String,
    pub text: String,
    pub media_path: Option<PathBuf>,
    pub media_kind: Option<MediaKind>,
    pub caption: Option<String>,
}

/// Result of a send, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub success: bool,
    pub detail: String,
}

impl SendOutcome {
    pub fn failure(err: &FacewatchError) -> Self {
        Self {
            success: false,
            detail: err.detail(),
        }
    }
}

/// Sends text and media through the session on behalf of any caller.
pub struct DispatchGateway {
    session: Arc<dyn SessionClient>,
}

impl DispatchGateway {
    pub fn new(session: Arc<dyn SessionClient>) -> Self {
        Self { session }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Sends `request` and reports the outcome. Never panics on collaborator
    /// failures.
    pub async fn send(&self, request: &SendRequest) -> SendOutcome {
        let outcome = match self.try_send(request).await {
            Ok(id) => {
                info!(destination = %request.destination, message_id = %id, "message sent");
                SendOutcome {
                    success: true,
                    detail: format!("Message sent to {} with ID: {id}", request.destination),
                }
            }
            Err(e) => {
                warn!(destination = %request.destination, error = %e.detail(), "send failed");
                SendOutcome::failure(&e)
            }
        };
        facewatch_prometheus::record_dispatch(outcome.success);
        outcome
    }

    async fn try_send(&self, request: &SendRequest) -> Result<String, FacewatchError> {
        let recipient = Recipient::parse(&request.destination)
            .ok_or_else(|| FacewatchError::Validation("destination is required".into()))?;
        let media_path = request
            .media_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());
        if request.text.is_empty() && media_path.is_none() {
            return Err(FacewatchError::Validation(
                "either text or a media path is required".into(),
            ));
        }
        if !self.session.is_connected() {
            return Err(FacewatchError::NotConnected);
        }

        let payload = match (media_path, &request.media_kind) {
            (Some(path), Some(MediaKind::Image)) => {
                let data = read_media(path).await?;
                self.image_payload(data, request.caption.clone()).await?
            }
            (Some(path), Some(MediaKind::Video)) => {
                let data = read_media(path).await?;
                self.video_payload(data, request.caption.clone()).await?
            }
            _ => {
                if request.text.is_empty() {
                    return Err(FacewatchError::Validation(format!(
                        "unsupported media kind {:?} and no text to send",
                        request.media_kind.as_ref().map(MediaKind::as_str)
                    )));
                }
                OutboundPayload::Text {
                    body: request.text.clone(),
                }
            }
        };

        self.session
            .send_message(&recipient, payload)
            .await
            .map_err(|e| FacewatchError::dispatch("error sending message", e))
    }

    async fn image_payload(
        &self,
        data: Vec<u8>,
        caption: Option<String>,
    ) -> Result<OutboundPayload, FacewatchError> {
        let input_bytes = data.len();
        let jpeg = tokio::task::spawn_blocking(move || transcode::to_jpeg(&data))
            .await
            .map_err(|e| FacewatchError::Internal(format!("transcode task failed: {e}")))??;
        debug!(
            input_bytes,
            output_bytes = jpeg.data.len(),
            width = jpeg.width,
            height = jpeg.height,
            "image re-encoded as JPEG"
        );

        let upload = self
            .session
            .upload(jpeg.data, MediaKind::Image)
            .await
            .map_err(|e| FacewatchError::dispatch("error uploading image", e))?;
        Ok(OutboundPayload::Image {
            upload,
            caption,
            mimetype: "image/jpeg".into(),
            width: jpeg.width,
            height: jpeg.height,
        })
    }

    async fn video_payload(
        &self,
        data: Vec<u8>,
        caption: Option<String>,
    ) -> Result<OutboundPayload, FacewatchError> {
        let mimetype = transcode::sniff_video_mimetype(&data).to_string();
        let upload = self
            .session
            .upload(data, MediaKind::Video)
            .await
            .map_err(|e| FacewatchError::dispatch("error uploading video", e))?;
        Ok(OutboundPayload::Video {
            upload,
            caption,
            mimetype,
        })
    }
}

async fn read_media(path: &std::path::Path) -> Result<Vec<u8>, FacewatchError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| FacewatchError::dispatch("error reading media file", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facewatch_test_utils::MockSession;
    use facewatch_test_utils::fixtures::sample_png;

    fn gateway(session: &Arc<MockSession>) -> DispatchGateway {
        DispatchGateway::new(session.clone())
    }

    fn text_request(destination: &str, text: &str) -> SendRequest {
        SendRequest {
            destination: destination.into(),
            text: text.into(),
            ..SendRequest::default()
        }
    }

    #[tokio::test]
    async fn text_send_to_group_reports_message_id() {
        let session = Arc::new(MockSession::new());
        let outcome = gateway(&session)
            .send(&text_request("123@g.us", "hello"))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.detail, "Message sent to 123@g.us with ID: mock-msg-1");
        let sent = session.sent_messages().await;
        assert_eq!(sent[0].to, Recipient::Group("123".into()));
        assert_eq!(sent[0].payload, OutboundPayload::Text { body: "hello".into() });
    }

    #[tokio::test]
    async fn plain_number_is_a_contact() {
        let session = Arc::new(MockSession::new());
        gateway(&session).send(&text_request("4915112345", "hi")).await;
        assert_eq!(
            session.sent_messages().await[0].to,
            Recipient::Contact("4915112345".into())
        );
    }

    #[tokio::test]
    async fn image_is_transcoded_uploaded_and_sent_with_caption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, sample_png(30)).unwrap();

        let session = Arc::new(MockSession::new());
        let outcome = gateway(&session)
            .send(&SendRequest {
                destination: "123@g.us".into(),
                media_path: Some(path),
                media_kind: Some(MediaKind::Image),
                caption: Some("Ann".into()),
                ..SendRequest::default()
            })
            .await;
        assert!(outcome.success, "{}", outcome.detail);

        let uploads = session.uploads().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, MediaKind::Image);
        assert!(uploads[0].1.starts_with(&[0xFF, 0xD8]));

        match &session.sent_messages().await[0].payload {
            OutboundPayload::Image {
                caption,
                mimetype,
                width,
                height,
                ..
            } => {
                assert_eq!(caption.as_deref(), Some("Ann"));
                assert_eq!(mimetype, "image/jpeg");
                assert_eq!((*width, *height), (4, 3));
            }
            other => panic!("expected image payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn video_is_uploaded_raw_with_sniffed_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        let mut bytes = vec![0, 0, 0, 0x18];
        bytes.extend_from_slice(b"ftypmp42rest-of-file");
        std::fs::write(&path, &bytes).unwrap();

        let session = Arc::new(MockSession::new());
        let outcome = gateway(&session)
            .send(&SendRequest {
                destination: "123@g.us".into(),
                media_path: Some(path),
                media_kind: Some(MediaKind::Video),
                ..SendRequest::default()
            })
            .await;
        assert!(outcome.success);
        assert_eq!(session.uploads().await[0].1, bytes);
        assert!(matches!(
            &session.sent_messages().await[0].payload,
            OutboundPayload::Video { mimetype, .. } if mimetype == "video/mp4"
        ));
    }

    #[tokio::test]
    async fn unknown_media_kind_falls_back_to_text() {
        let session = Arc::new(MockSession::new());
        let outcome = gateway(&session)
            .send(&SendRequest {
                destination: "123@g.us".into(),
                text: "see attachment".into(),
                media_path: Some("/nonexistent/file.pdf".into()),
                media_kind: Some(MediaKind::Other("document".into())),
                caption: None,
            })
            .await;

        assert!(outcome.success);
        assert!(session.uploads().await.is_empty());
        assert_eq!(
            session.sent_messages().await[0].payload,
            OutboundPayload::Text { body: "see attachment".into() }
        );
    }

    #[tokio::test]
    async fn corrupt_image_reports_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let session = Arc::new(MockSession::new());
        let outcome = gateway(&session)
            .send(&SendRequest {
                destination: "123@g.us".into(),
                media_path: Some(path),
                media_kind: Some(MediaKind::Image),
                ..SendRequest::default()
            })
            .await;
        assert!(!outcome.success);
        assert!(outcome.detail.contains("error decoding image"));
        assert_eq!(session.sent_count().await, 0);
    }

    #[tokio::test]
    async fn upload_failure_carries_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, sample_png(1)).unwrap();

        let session = Arc::new(MockSession::new());
        session.fail_uploads(true);
        let outcome = gateway(&session)
            .send(&SendRequest {
                destination: "123@g.us".into(),
                media_path: Some(path),
                media_kind: Some(MediaKind::Image),
                ..SendRequest::default()
            })
            .await;
        assert!(!outcome.success);
        assert!(outcome.detail.contains("error uploading image"));
        assert!(outcome.detail.contains("upload rejected"));
    }

    #[tokio::test]
    async fn missing_file_and_send_failure_are_reported() {
        let session = Arc::new(MockSession::new());
        let outcome = gateway(&session)
            .send(&SendRequest {
                destination: "123@g.us".into(),
                media_path: Some("/nonexistent/photo.jpg".into()),
                media_kind: Some(MediaKind::Image),
                ..SendRequest::default()
            })
            .await;
        assert!(outcome.detail.contains("error reading media file"));

        session.fail_sends(true);
        let outcome = gateway(&session).send(&text_request("123@g.us", "x")).await;
        assert!(!outcome.success);
        assert!(outcome.detail.contains("error sending message"));
    }

    #[tokio::test]
    async fn preconditions_are_checked_before_sending() {
        let session = Arc::new(MockSession::new());
        let gw = gateway(&session);

        assert!(!gw.send(&text_request("", "hi")).await.success);
        assert!(!gw.send(&text_request("123@g.us", "")).await.success);

        session.set_connected(false);
        let outcome = gw.send(&text_request("123@g.us", "hi")).await;
        assert_eq!(outcome.detail, "not connected to messaging network");
        assert_eq!(session.sent_count().await, 0);
    }
}
