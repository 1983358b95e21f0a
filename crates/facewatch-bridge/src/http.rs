// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON HTTP API of the protocol sidecar.
//!
//! | Call | Request | Response |
//! |---|---|---|
//! | `POST /download` | `{handle}` | `{data}` (base64) |
//! | `POST /upload` | `{kind, data}` (base64) | `{handle, file_length}` |
//! | `POST /send` | `{to, payload}` | `{id}` |
//! | `GET /groups` | | `[{id, name}]` |
//! | `GET /contacts/{jid}` | | `{name}`, or 404 |
//! | `GET /me` | | `{id}` |

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use facewatch_core::{
    AttachmentHandle, FacewatchError, GroupInfo, MediaKind, OutboundPayload, Recipient,
    UploadedMedia,
};

#[derive(Serialize)]
struct DownloadRequest<'a> {
    handle: &'a AttachmentHandle,
}

#[derive(Deserialize)]
struct DownloadResponse {
    data: String,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    kind: &'a str,
    data: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    to: String,
    payload: &'a OutboundPayload,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Deserialize)]
struct ContactResponse {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct MeResponse {
    id: String,
}

fn status_error(context: &str, status: reqwest::StatusCode, body: String) -> FacewatchError {
    FacewatchError::Session {
        message: format!("{context}: sidecar returned {status}: {body}"),
        source: None,
    }
}

/// Thin client for the sidecar's HTTP endpoints.
#[derive(Debug, Clone)]
pub struct SidecarApi {
    client: reqwest::Client,
    base_url: String,
}

impl SidecarApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FacewatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FacewatchError::session("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read<T: DeserializeOwned>(
        context: &str,
        response: reqwest::Response,
    ) -> Result<T, FacewatchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(context, status, body));
        }
        response
            .json()
            .await
            .map_err(|e| FacewatchError::session(format!("{context}: invalid response"), e))
    }

    async fn get<T: DeserializeOwned>(&self, context: &str, path: &str) -> Result<T, FacewatchError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| FacewatchError::session(context, e))?;
        Self::read(context, response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        context: &str,
        path: &str,
        body: &B,
    ) -> Result<T, FacewatchError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| FacewatchError::session(context, e))?;
        Self::read(context, response).await
    }

    pub async fn download(&self, handle: &AttachmentHandle) -> Result<Vec<u8>, FacewatchError> {
        let response: DownloadResponse = self
            .post("download failed", "/download", &DownloadRequest { handle })
            .await?;
        STANDARD
            .decode(response.data)
            .map_err(|e| FacewatchError::session("download failed: invalid base64 payload", e))
    }

    pub async fn upload(
        &self,
        data: &[u8],
        kind: &MediaKind,
    ) -> Result<UploadedMedia, FacewatchError> {
        let request = UploadRequest {
            kind: kind.as_str(),
            data: STANDARD.encode(data),
        };
        self.post("upload failed", "/upload", &request).await
    }

    pub async fn send(
        &self,
        to: &Recipient,
        payload: &OutboundPayload,
    ) -> Result<String, FacewatchError> {
        let request = SendRequest {
            to: to.address(),
            payload,
        };
        let response: SendResponse = self.post("send failed", "/send", &request).await?;
        Ok(response.id)
    }

    pub async fn groups(&self) -> Result<Vec<GroupInfo>, FacewatchError> {
        self.get("group listing failed", "/groups").await
    }

    /// Display name of a chat. An unknown chat (404) has no name.
    pub async fn contact_name(&self, jid: &str) -> Result<Option<String>, FacewatchError> {
        let context = "contact lookup failed";
        let response = self
            .client
            .get(self.url(&format!("/contacts/{jid}")))
            .send()
            .await
            .map_err(|e| FacewatchError::session(context, e))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let contact: ContactResponse = Self::read(context, response).await?;
        Ok(contact.name.filter(|name| !name.is_empty()))
    }

    pub async fn me(&self) -> Result<String, FacewatchError> {
        let me: MeResponse = self.get("own id lookup failed", "/me").await?;
        Ok(me.id)
    }
}
