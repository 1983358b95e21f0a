// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `facewatch --list-groups`: print the joined groups and exit.

use std::io::Write;
use std::time::Duration;

use facewatch_bridge::BridgeSession;
use facewatch_config::FacewatchConfig;
use facewatch_core::{FacewatchError, GroupInfo, SessionClient, SessionEvent};
use facewatch_ingest::render_pairing_code;

/// Connects, prints every joined group to stdout and disconnects.
pub async fn run_list_groups(config: FacewatchConfig) -> Result<(), FacewatchError> {
    crate::serve::init_tracing(&config.log.level);
    let session = BridgeSession::new(&config.session)?;
    session.connect().await?;

    let result = async {
        await_connected(
            &session,
            Duration::from_secs(config.session.pairing_timeout_secs),
        )
        .await?;
        let groups = session.joined_groups().await?;
        write_groups(&mut std::io::stdout().lock(), &groups)
    }
    .await;

    session.disconnect().await?;
    result
}

/// Consumes session events until the session is connected, showing any
/// pairing code on stderr.
pub async fn await_connected(
    session: &dyn SessionClient,
    timeout: Duration,
) -> Result<(), FacewatchError> {
    let wait = async {
        loop {
            match session.next_event().await? {
                Some(SessionEvent::Connected) => return Ok(()),
                Some(SessionEvent::PairingCode(code)) => {
                    eprintln!("\nScan this QR code with your WhatsApp app:");
                    eprintln!("{}", render_pairing_code(&code)?);
                }
                Some(SessionEvent::LoggedOut) => {
                    return Err(FacewatchError::Session {
                        message: "session logged out before connecting".into(),
                        source: None,
                    });
                }
                Some(_) => {}
                None => {
                    return Err(FacewatchError::Session {
                        message: "event stream ended before connecting".into(),
                        source: None,
                    });
                }
            }
        }
    };
    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| FacewatchError::Timeout { duration: timeout })?
}

/// Writes the group listing in the operator-facing format.
pub fn write_groups(out: &mut dyn Write, groups: &[GroupInfo]) -> Result<(), FacewatchError> {
    let io = |e: std::io::Error| FacewatchError::Internal(format!("failed to write group list: {e}"));

    writeln!(out, "\n=== WhatsApp Groups ===").map_err(io)?;
    writeln!(out, "Found {} groups:\n", groups.len()).map_err(io)?;
    for (i, group) in groups.iter().enumerate() {
        writeln!(out, "{}. Name: {}\n   ID: {}\n", i + 1, group.name, group.id).map_err(io)?;
    }
    writeln!(
        out,
        "To use a group in your configuration, copy the ID (including @g.us) into config.json."
    )
    .map_err(io)?;
    Ok(())
}
