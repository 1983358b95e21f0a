// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for shutdown and reference reloads.
//!
//! SIGTERM and SIGINT (Ctrl+C) cancel a [`CancellationToken`] that the
//! router and match engine monitor. SIGHUP requests a reload of the
//! reference embeddings.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                        _ = token_clone.cancelled() => return,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, Ctrl+C only");
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = token_clone.cancelled() => return,
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => info!("received Ctrl+C, initiating shutdown"),
                _ = token_clone.cancelled() => return,
            }
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Installs a SIGHUP handler that notifies the returned [`Notify`].
///
/// The handler stops when `cancel` fires. On non-unix platforms the notify
/// is never triggered.
pub fn install_reload_handler(cancel: CancellationToken) -> Arc<Notify> {
    let reload = Arc::new(Notify::new());

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let notify = Arc::clone(&reload);
        tokio::spawn(async move {
            let mut sighup = match signal(SignalKind::hangup()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "failed to install SIGHUP handler, reload disabled");
                    return;
                }
            };
            loop {
                tokio::select! {
                    received = sighup.recv() => {
                        if received.is_none() {
                            break;
                        }
                        info!("received SIGHUP, reloading reference faces");
                        notify.notify_one();
                    }
                    _ = cancel.cancelled() => break,
                }
            }
            debug!("reload signal handler stopped");
        });
    }

    #[cfg(not(unix))]
    drop(cancel);

    reload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_live_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        // Cancelling manually also stops the background task.
        token.cancel();
    }

    #[tokio::test]
    async fn reload_handler_stops_with_cancellation() {
        let cancel = CancellationToken::new();
        let reload = install_reload_handler(cancel.clone());
        cancel.cancel();
        // No reload is pending.
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(20), reload.notified()).await;
        assert!(pending.is_err());
    }
}
