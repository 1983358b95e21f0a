// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for a running instance's command surface.
//!
//! Used by the `send` subcommand. The session is owned by the serving
//! process, so sends from another process go through POST /api/send.

use std::time::Duration;

use reqwest::StatusCode;

use facewatch_core::FacewatchError;

use crate::dispatch::SendOutcome;
use crate::handlers::{SendMessageRequest, SendMessageResponse};

const DEFAULT_SUCCESS: &str = "Message sent successfully";

/// Posts send requests to a command surface and reports the outcome.
#[derive(Debug, Clone)]
pub struct CommandClient {
    client: reqwest::Client,
    send_url: String,
}

impl CommandClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, FacewatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FacewatchError::dispatch("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            send_url: format!("{}/api/send", server_url.trim_end_matches('/')),
        })
    }

    /// Sends `request`. Transport and server failures become an
    /// unsuccessful outcome rather than an error.
    pub async fn send(&self, request: &SendMessageRequest) -> SendOutcome {
        let response = match self.client.post(&self.send_url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                return SendOutcome {
                    success: false,
                    detail: format!("Connection error: {e}"),
                };
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<SendMessageResponse>(&body)
            .ok()
            .map(|r| r.message)
            .filter(|m| !m.is_empty());

        if status == StatusCode::OK {
            SendOutcome {
                success: true,
                detail: message.unwrap_or_else(|| DEFAULT_SUCCESS.to_string()),
            }
        } else {
            SendOutcome {
                success: false,
                detail: message
                    .unwrap_or_else(|| format!("HTTP Error: {} - {body}", status.as_u16())),
            }
        }
    }
}
