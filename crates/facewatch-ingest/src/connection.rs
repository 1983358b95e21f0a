// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle as observed through session events.

use std::time::Duration;

use qrcode::QrCode;
use qrcode::render::unicode::Dense1x2;
use tokio::sync::watch;

use facewatch_core::FacewatchError;

/// Lifecycle state of the messaging session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connect requested, no event seen yet.
    Connecting,
    /// A pairing code was issued and is waiting to be scanned.
    AwaitingPairing,
    Connected,
    Disconnected,
    /// The device was unlinked; manual re-pairing is required.
    LoggedOut,
}

/// Creates the channel the router publishes connection state on.
pub fn connection_channel() -> (
    watch::Sender<ConnectionState>,
    watch::Receiver<ConnectionState>,
) {
    watch::channel(ConnectionState::Connecting)
}

/// Waits until the session reports [`ConnectionState::Connected`].
///
/// Fails if the session logs out first or `timeout` elapses.
pub async fn wait_for_connected(
    state: &mut watch::Receiver<ConnectionState>,
    timeout: Duration,
) -> Result<(), FacewatchError> {
    let reached = tokio::time::timeout(
        timeout,
        state.wait_for(|s| matches!(s, ConnectionState::Connected | ConnectionState::LoggedOut)),
    )
    .await
    .map_err(|_| FacewatchError::Timeout { duration: timeout })?
    .map(|s| *s)
    .map_err(|e| FacewatchError::session("connection state channel closed", e))?;

    match reached {
        ConnectionState::Connected => Ok(()),
        _ => Err(FacewatchError::Session {
            message: "session logged out before connecting".into(),
            source: None,
        }),
    }
}

/// Renders a pairing code as a terminal QR code.
pub fn render_pairing_code(code: &str) -> Result<String, FacewatchError> {
    let qr = QrCode::new(code.as_bytes())
        .map_err(|e| FacewatchError::session("failed to encode pairing code", e))?;
    Ok(qr
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_once_connected() {
        let (tx, mut rx) = connection_channel();
        tokio::spawn(async move {
            tx.send_replace(ConnectionState::AwaitingPairing);
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send_replace(ConnectionState::Connected);
            // Keep the sender alive until the waiter has observed the value.
            tokio::time::sleep(Duration::from_millis(200)).await;
        });
        wait_for_connected(&mut rx, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wait_fails_on_logout() {
        let (tx, mut rx) = connection_channel();
        tx.send_replace(ConnectionState::LoggedOut);
        let err = wait_for_connected(&mut rx, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FacewatchError::Session { .. }));
    }

    #[tokio::test]
    async fn wait_times_out() {
        let (_tx, mut rx) = connection_channel();
        let err = wait_for_connected(&mut rx, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, FacewatchError::Timeout { .. }));
    }

    #[test]
    fn pairing_code_renders_multiline() {
        let rendered = render_pairing_code("2@abc,def,ghi").unwrap();
        assert!(rendered.lines().count() > 5);
    }
}
