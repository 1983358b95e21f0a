// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `facewatch send`: deliver one message through a running instance, either
//! now or at a local date and time.
//!
//! A scheduled send is tracked in `<schedule_dir>/<id>.json`, written when
//! the send is scheduled and rewritten with the result.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use facewatch_core::FacewatchError;
use facewatch_gateway::handlers::SendMessageRequest;
use facewatch_gateway::{CommandClient, SendOutcome};

/// Input format for `--at`, in local time.
pub const SEND_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bounds one request to the command surface. Longer than the server's own
/// send timeout so its answer arrives first.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

/// Everything `facewatch send` needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct SendCommand {
    /// Base URL of the running instance's command surface.
    pub server: String,
    pub request: SendMessageRequest,
    /// Local send time in [`SEND_TIME_FORMAT`]; `None` sends now.
    pub at: Option<String>,
    pub schedule_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Sent,
    Failed,
    Cancelled,
}

/// Contents of a schedule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: i64,
    pub phone: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub scheduled_time: String,
    pub status: ScheduleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_time: Option<String>,
}

/// Runs the subcommand, printing progress and the outcome to stdout.
/// Returns whether the message was delivered.
pub async fn run_send(command: SendCommand) -> Result<bool, FacewatchError> {
    crate::serve::init_tracing("warn");
    let mut request = command.request;
    if request.phone.trim().is_empty() {
        return Err(FacewatchError::Validation("a phone number or group id is required".into()));
    }
    if request.message.is_empty() && request.media_url.is_none() {
        return Err(FacewatchError::Validation(
            "either a message or --media is required".into(),
        ));
    }
    // The serving process resolves the path, possibly from another directory.
    if let Some(media) = request.media_url.take() {
        let absolute = std::path::absolute(&media).map_err(|e| {
            FacewatchError::Validation(format!("cannot resolve media path {media}: {e}"))
        })?;
        request.media_url = Some(absolute.to_string_lossy().into_owned());
    }

    let at = command.at.as_deref().map(parse_send_time).transpose()?;
    let client = CommandClient::new(&command.server, CLIENT_TIMEOUT)?;
    let mut out = std::io::stdout();

    let outcome = match at {
        None => client.send(&request).await,
        Some(at) => {
            let cancel = facewatch_ingest::install_signal_handler();
            let (outcome, _) =
                send_at(&client, &request, at, &command.schedule_dir, &mut out, &cancel).await?;
            cancel.cancel();
            outcome
        }
    };
    report(&mut out, &outcome)?;
    Ok(outcome.success)
}

/// Parses a `--at` value as a local date and time.
pub fn parse_send_time(text: &str) -> Result<DateTime<Local>, FacewatchError> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), SEND_TIME_FORMAT).map_err(|_| {
        FacewatchError::Validation("Date-time must be in format: YYYY-MM-DD HH:MM".into())
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| FacewatchError::Validation(format!("{text} does not exist in local time")))
}

/// Describes a wait in its largest whole unit.
pub fn format_wait(wait: Duration) -> String {
    let secs = wait.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{} hours, {} minutes", secs / 3600, (secs % 3600) / 60)
    }
}

/// Records the send, waits until `at` and sends. A time in the past sends
/// immediately. Cancelling `cancel` during the wait abandons the send.
///
/// Returns the outcome and the path of the schedule file.
pub async fn send_at(
    client: &CommandClient,
    request: &SendMessageRequest,
    at: DateTime<Local>,
    schedule_dir: &Path,
    out: &mut (dyn Write + Send),
    cancel: &CancellationToken,
) -> Result<(SendOutcome, PathBuf), FacewatchError> {
    let now = Local::now();
    let wait = (at - now).to_std().ok().filter(|w| !w.is_zero());
    match wait {
        Some(wait) => {
            print(out, &format!("Message scheduled to be sent in {}", format_wait(wait)))?;
            print(out, &format!("Scheduled time: {}", at.format(RECORD_TIME_FORMAT)))?;
        }
        None => print(out, "The specified time is in the past. Sending immediately.")?,
    }

    let mut record = ScheduleRecord {
        id: now.timestamp_millis(),
        phone: request.phone.clone(),
        message: request.message.clone(),
        media_url: request.media_url.clone(),
        scheduled_time: at.format(RECORD_TIME_FORMAT).to_string(),
        status: ScheduleStatus::Scheduled,
        result: None,
        sent_time: None,
    };
    let path = schedule_dir.join(format!("{}.json", record.id));
    write_record(&path, &record).await?;
    info!(path = %path.display(), scheduled_time = %record.scheduled_time, "send scheduled");

    if let Some(wait) = wait {
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => {
                record.status = ScheduleStatus::Cancelled;
                write_record(&path, &record).await?;
                let outcome = SendOutcome {
                    success: false,
                    detail: "Operation cancelled by user".into(),
                };
                return Ok((outcome, path));
            }
        }
    }

    let outcome = client.send(request).await;
    record.status = if outcome.success {
        ScheduleStatus::Sent
    } else {
        ScheduleStatus::Failed
    };
    record.result = Some(outcome.detail.clone());
    record.sent_time = Some(Local::now().format(RECORD_TIME_FORMAT).to_string());
    write_record(&path, &record).await?;
    Ok((outcome, path))
}

/// Reads a schedule file.
pub async fn read_record(path: &Path) -> Result<ScheduleRecord, FacewatchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FacewatchError::Internal(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FacewatchError::Internal(format!("invalid schedule file {}: {e}", path.display())))
}

async fn write_record(path: &Path, record: &ScheduleRecord) -> Result<(), FacewatchError> {
    let io = |e: std::io::Error| {
        FacewatchError::Internal(format!("failed to write {}: {e}", path.display()))
    };
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(io)?;
    }
    let body = serde_json::to_vec_pretty(record)
        .map_err(|e| FacewatchError::Internal(format!("failed to encode schedule: {e}")))?;
    // Readers never see a partly written file.
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, body).await.map_err(io)?;
    tokio::fs::rename(&staging, path).await.map_err(io)
}

fn print(out: &mut (dyn Write + Send), line: &str) -> Result<(), FacewatchError> {
    writeln!(out, "{line}")
        .map_err(|e| FacewatchError::Internal(format!("failed to write output: {e}")))
}

/// Prints the final outcome line.
pub fn report(out: &mut (dyn Write + Send), outcome: &SendOutcome) -> Result<(), FacewatchError> {
    if outcome.success {
        print(out, &format!("✓ Success: {}", outcome.detail))
    } else {
        print(out, &format!("✗ Error: {}", outcome.detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> SendMessageRequest {
        SendMessageRequest {
            phone: "12345".into(),
            message: "dinner at 8".into(),
            ..Default::default()
        }
    }

    async fn surface(status: u16, message: &str, expected_sends: u64) -> (MockServer, CommandClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/send"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "success": status == 200, "message": message })),
            )
            .expect(expected_sends)
            .mount(&server)
            .await;
        let client = CommandClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        (server, client)
    }

    fn only_record(dir: &Path) -> PathBuf {
        let files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1, "{files:?}");
        files.into_iter().next().unwrap()
    }

    #[test]
    fn send_times_are_local_minutes() {
        let at = parse_send_time(" 2026-03-01 09:30 ").unwrap();
        assert_eq!((at.year(), at.month(), at.day()), (2026, 3, 1));
        assert_eq!((at.hour(), at.minute(), at.second()), (9, 30, 0));
    }

    #[test]
    fn malformed_send_time_names_the_format() {
        for text in ["tomorrow", "2026-03-01", "01/03/2026 09:30", "2026-13-01 09:30"] {
            let err = parse_send_time(text).unwrap_err();
            assert_eq!(
                err.to_string(),
                "validation error: Date-time must be in format: YYYY-MM-DD HH:MM",
                "{text}"
            );
        }
    }

    #[test]
    fn waits_are_described_in_the_largest_unit() {
        assert_eq!(format_wait(Duration::from_secs(45)), "45 seconds");
        assert_eq!(format_wait(Duration::from_secs(150)), "2 minutes");
        assert_eq!(format_wait(Duration::from_secs(3 * 3600 + 5 * 60 + 10)), "3 hours, 5 minutes");
    }

    #[test]
    fn report_marks_success_and_failure() {
        let mut out = Vec::new();
        report(&mut out, &SendOutcome { success: true, detail: "sent".into() }).unwrap();
        report(&mut out, &SendOutcome { success: false, detail: "offline".into() }).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "✓ Success: sent\n✗ Error: offline\n");
    }

    #[tokio::test]
    async fn past_time_sends_immediately_and_records_the_result() {
        let (_server, client) = surface(200, "Message sent to 12345 with ID: m1", 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let at = Local::now() - chrono::Duration::hours(1);

        let (outcome, path) = send_at(
            &client,
            &request(),
            at,
            dir.path(),
            &mut out,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert!(String::from_utf8(out).unwrap().contains("in the past. Sending immediately."));
        assert_eq!(only_record(dir.path()), path);

        let record = read_record(&path).await.unwrap();
        assert_eq!(record.status, ScheduleStatus::Sent);
        assert_eq!(record.phone, "12345");
        assert_eq!(record.message, "dinner at 8");
        assert_eq!(record.scheduled_time, at.format(RECORD_TIME_FORMAT).to_string());
        assert_eq!(record.result.as_deref(), Some("Message sent to 12345 with ID: m1"));
        assert!(record.sent_time.is_some());
    }

    #[tokio::test]
    async fn rejected_send_is_recorded_as_failed() {
        let (_server, client) = surface(500, "not connected to messaging network", 1).await;
        let dir = tempfile::tempdir().unwrap();

        let (outcome, path) = send_at(
            &client,
            &request(),
            Local::now(),
            dir.path(),
            &mut Vec::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        let record = read_record(&path).await.unwrap();
        assert_eq!(record.status, ScheduleStatus::Failed);
        assert_eq!(record.result.as_deref(), Some("not connected to messaging network"));
    }

    #[tokio::test]
    async fn future_time_waits_before_sending() {
        let (_server, client) = surface(200, "ok", 1).await;
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let started = std::time::Instant::now();

        let (outcome, _) = send_at(
            &client,
            &request(),
            Local::now() + chrono::Duration::milliseconds(1200),
            dir.path(),
            &mut out,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert!(started.elapsed() >= Duration::from_secs(1));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Message scheduled to be sent in 1 seconds"), "{text}");
        assert!(text.contains("Scheduled time: "));
    }

    #[tokio::test]
    async fn cancelled_wait_is_recorded_and_nothing_is_sent() {
        let (_server, client) = surface(200, "ok", 0).await;
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let task = {
            let dir = dir.path().to_path_buf();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                send_at(
                    &client,
                    &request(),
                    Local::now() + chrono::Duration::hours(1),
                    &dir,
                    &mut Vec::new(),
                    &cancel,
                )
                .await
            })
        };

        let path = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let record = std::fs::read_dir(dir.path())
                    .unwrap()
                    .map(|e| e.unwrap().path())
                    .find(|p| p.extension().is_some_and(|ext| ext == "json"));
                if let Some(path) = record {
                    return path;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        let pending = read_record(&path).await.unwrap();
        assert_eq!(pending.status, ScheduleStatus::Scheduled);
        assert!(pending.result.is_none());

        cancel.cancel();
        let (outcome, finished) = task.await.unwrap().unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.detail, "Operation cancelled by user");
        assert_eq!(finished, path);
        assert_eq!(read_record(&path).await.unwrap().status, ScheduleStatus::Cancelled);
    }

    #[test]
    fn schedule_file_uses_lowercase_status_and_omits_unset_fields() {
        let record = ScheduleRecord {
            id: 1,
            phone: "p".into(),
            message: "m".into(),
            media_url: None,
            scheduled_time: "2026-03-01 09:30:00".into(),
            status: ScheduleStatus::Scheduled,
            result: None,
            sent_time: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "phone": "p",
                "message": "m",
                "scheduled_time": "2026-03-01 09:30:00",
                "status": "scheduled"
            })
        );
    }
}
