// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Facewatch binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use facewatch::send::SendCommand;
use facewatch_gateway::handlers::SendMessageRequest;

/// Watches messaging groups for known faces and forwards matching photos.
#[derive(Parser, Debug)]
#[command(name = "facewatch", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// List the joined groups and exit.
    #[arg(long)]
    list_groups: bool,

    /// Port for the command surface; overrides `gateway.port`.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message through a running instance, now or at a set time.
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Phone number or group id (ending in @g.us).
    phone: String,

    /// Message text; optional when --media is given.
    #[arg(default_value = "")]
    message: String,

    /// Media file to send.
    #[arg(long)]
    media: Option<PathBuf>,

    /// Media kind: image or video.
    #[arg(long, requires = "media")]
    media_type: Option<String>,

    /// Caption for the media.
    #[arg(long, requires = "media")]
    caption: Option<String>,

    /// Local send time, "YYYY-MM-DD HH:MM".
    #[arg(long)]
    at: Option<String>,

    /// Base URL of the running instance's command surface.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Directory for schedule files written by --at.
    #[arg(long, default_value = "scheduled_messages")]
    schedule_dir: PathBuf,
}

impl SendArgs {
    fn into_command(self) -> SendCommand {
        SendCommand {
            server: self.server,
            request: SendMessageRequest {
                phone: self.phone,
                message: self.message,
                media_url: self.media.map(|p| p.to_string_lossy().into_owned()),
                media_type: self.media_type,
                caption: self.caption,
            },
            at: self.at,
            schedule_dir: self.schedule_dir,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sending talks to a running instance and needs no configuration.
    if let Some(Commands::Send(args)) = cli.command {
        match facewatch::send::run_send(args.into_command()).await {
            Ok(true) => return,
            Ok(false) => std::process::exit(1),
            Err(e) => {
                eprintln!("facewatch: {}", e.detail());
                std::process::exit(1);
            }
        }
    }

    let mut config = match facewatch_config::load_and_validate(&cli.config) {
        Ok(config) => config,
        Err(errors) => {
            facewatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let result = if cli.list_groups {
        facewatch::groups::run_list_groups(config).await
    } else {
        if let Err(errors) = facewatch_config::validate_reference_dirs(&config) {
            facewatch_config::render_errors(&errors);
            std::process::exit(1);
        }
        facewatch::serve::run_serve(config).await
    };

    if let Err(e) = result {
        eprintln!("facewatch: {}", e.detail());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_and_overrides() {
        let cli = Cli::parse_from(["facewatch"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.list_groups);
        assert_eq!(cli.port, None);

        let cli = Cli::parse_from(["facewatch", "--config", "/etc/fw.json", "--list-groups", "--port", "9090"]);
        assert_eq!(cli.config, PathBuf::from("/etc/fw.json"));
        assert!(cli.list_groups);
        assert_eq!(cli.port, Some(9090));
        assert!(cli.command.is_none());
    }

    #[test]
    fn send_subcommand_builds_a_text_request() {
        let cli = Cli::parse_from(["facewatch", "send", "12345", "hello there"]);
        let Some(Commands::Send(args)) = cli.command else {
            panic!("expected send subcommand");
        };
        let command = args.into_command();
        assert_eq!(command.server, "http://127.0.0.1:8080");
        assert_eq!(command.schedule_dir, PathBuf::from("scheduled_messages"));
        assert_eq!(command.at, None);
        assert_eq!(command.request.phone, "12345");
        assert_eq!(command.request.message, "hello there");
        assert!(command.request.media_url.is_none());
    }

    #[test]
    fn send_subcommand_accepts_media_and_a_send_time() {
        let cli = Cli::parse_from([
            "facewatch",
            "send",
            "111@g.us",
            "--media",
            "/tmp/photo.jpg",
            "--media-type",
            "image",
            "--caption",
            "look",
            "--at",
            "2026-12-24 18:00",
            "--server",
            "http://10.0.0.2:9000",
        ]);
        let Some(Commands::Send(args)) = cli.command else {
            panic!("expected send subcommand");
        };
        let command = args.into_command();
        assert_eq!(command.server, "http://10.0.0.2:9000");
        assert_eq!(command.at.as_deref(), Some("2026-12-24 18:00"));
        assert_eq!(command.request.message, "");
        assert_eq!(command.request.media_url.as_deref(), Some("/tmp/photo.jpg"));
        assert_eq!(command.request.media_type.as_deref(), Some("image"));
        assert_eq!(command.request.caption.as_deref(), Some("look"));
    }

    #[test]
    fn caption_without_media_is_rejected() {
        let parsed = Cli::try_parse_from(["facewatch", "send", "12345", "hi", "--caption", "x"]);
        assert!(parsed.is_err());
    }
}
