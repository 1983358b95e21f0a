// SPDX-FileCopyrightText: 2026 Facewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `facewatch` serve mode.
//!
//! Wires the archive, staging watcher, event router, match engine and
//! command surface around one messaging session, then runs until a
//! shutdown signal arrives or the session's event stream ends.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use facewatch_bridge::BridgeSession;
use facewatch_config::FacewatchConfig;
use facewatch_core::{ArchiveAdapter, FaceEmbedder, FacewatchError, SessionClient};
use facewatch_gateway::{DispatchGateway, GatewayState, HealthState};
use facewatch_ingest::{EventRouter, connection_channel, wait_for_connected};
use facewatch_matcher::{HttpFaceEmbedder, IdentityRegistry, MatchEngine};
use facewatch_media::{MediaPipeline, StagingWatcher, sweep_staging};
use facewatch_prometheus::PrometheusExporter;
use facewatch_storage::SqliteArchive;

/// Upper bound on finishing in-flight work after shutdown is requested.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Render function behind `GET /metrics`.
pub type MetricsRender = Arc<dyn Fn() -> String + Send + Sync>;

/// External collaborators of a running pipeline.
pub struct Runtime {
    pub session: Arc<dyn SessionClient>,
    pub embedder: Arc<dyn FaceEmbedder>,
    /// Listener for the command surface.
    pub listener: TcpListener,
    pub prometheus_render: Option<MetricsRender>,
    /// Fires on shutdown.
    pub cancel: CancellationToken,
    /// Notified when reference photos should be reloaded.
    pub reload: Arc<Notify>,
}

/// Runs `facewatch` with the production session, embedder and signal
/// handlers.
pub async fn run_serve(config: FacewatchConfig) -> Result<(), FacewatchError> {
    init_tracing(&config.log.level);
    info!(
        groups = config.input_groups.len(),
        identities = config.destinations.len(),
        "starting facewatch"
    );

    let prometheus_render = match PrometheusExporter::install() {
        Ok(exporter) => Some(Arc::new(move || exporter.render()) as MetricsRender),
        Err(e) => {
            warn!(error = %e, "prometheus initialization failed, continuing without metrics");
            None
        }
    };

    let embedder = Arc::new(HttpFaceEmbedder::new(
        &config.embedder,
        &config.face_detection.model,
    )?);
    let session = Arc::new(BridgeSession::new(&config.session)?);
    let listener = facewatch_gateway::bind(&config.gateway.host, config.gateway.port).await?;

    let cancel = facewatch_ingest::install_signal_handler();
    let reload = facewatch_ingest::install_reload_handler(cancel.clone());

    run(
        config,
        Runtime {
            session,
            embedder,
            listener,
            prometheus_render,
            cancel,
            reload,
        },
    )
    .await
}

/// Runs the full pipeline until `runtime.cancel` fires or the session's
/// event stream ends.
///
/// Shutdown order: stop intake, drain in-flight work (bounded by
/// [`DRAIN_TIMEOUT`]), close the archive, disconnect the session.
pub async fn run(config: FacewatchConfig, runtime: Runtime) -> Result<(), FacewatchError> {
    let Runtime {
        session,
        embedder,
        listener,
        prometheus_render,
        cancel,
        reload,
    } = runtime;

    let registry = Arc::new(IdentityRegistry::load(config.clone(), Arc::clone(&embedder)).await?);

    let archive = Arc::new(SqliteArchive::new(config.storage.clone()));
    archive.initialize().await?;

    let store = PathBuf::from(&config.media.store_path);
    tokio::fs::create_dir_all(&store)
        .await
        .map_err(|e| FacewatchError::media("failed to create staging directory", e))?;
    let swept = sweep_staging(&store).await?;
    if swept > 0 {
        info!(files = swept, "removed leftover staged files");
    }

    // Watch before connecting so images from the first backlog sync are seen.
    let staged = StagingWatcher::new(config.media.clone()).start()?;

    let (state_tx, mut state_rx) = connection_channel();
    let router = Arc::new(EventRouter::new(
        Arc::clone(&session),
        Arc::clone(&archive) as Arc<dyn ArchiveAdapter>,
        MediaPipeline::new(Arc::clone(&session), &config.media),
        state_tx,
    ));

    // Cancelling intake stops the router, matcher, reloader and HTTP server.
    let intake = cancel.child_token();

    session.connect().await?;
    let router_task = {
        let router = Arc::clone(&router);
        let intake = intake.clone();
        tokio::spawn(async move {
            let result = router.run(intake.clone()).await;
            // A dead event stream ends the process.
            intake.cancel();
            result
        })
    };

    let pairing_timeout = Duration::from_secs(config.session.pairing_timeout_secs);
    let connected = tokio::select! {
        biased;
        result = wait_for_connected(&mut state_rx, pairing_timeout) => result,
        _ = intake.cancelled() => Err(FacewatchError::NotConnected),
    };
    if let Err(e) = connected {
        error!(error = %e, "session did not connect");
        intake.cancel();
        let _ = router_task.await;
        close(archive.as_ref(), session.as_ref()).await;
        return Err(e);
    }
    info!("session connected");

    let gateway = Arc::new(DispatchGateway::new(Arc::clone(&session)));
    let engine = Arc::new(MatchEngine::new(
        &config,
        Arc::clone(&registry),
        Arc::clone(&embedder),
        Arc::clone(&gateway),
    ));

    let http_task = tokio::spawn(facewatch_gateway::serve(
        listener,
        GatewayState {
            gateway,
            send_timeout: Duration::from_secs(config.gateway.send_timeout_secs),
            health: HealthState {
                start_time: Instant::now(),
                prometheus_render,
            },
        },
        intake.clone(),
    ));
    let matcher_task = {
        let engine = Arc::clone(&engine);
        let intake = intake.clone();
        tokio::spawn(async move { engine.run(staged, intake).await })
    };
    let reload_task = {
        let registry = Arc::clone(&registry);
        let intake = intake.clone();
        tokio::spawn(async move { registry.reload_on(reload, intake).await })
    };

    info!("facewatch running");
    intake.cancelled().await;
    if cancel.is_cancelled() {
        info!("shutdown requested, stopping intake");
    } else {
        warn!("session event stream ended, shutting down");
    }

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        let (router_result, http_result, matcher_result, reload_result) =
            tokio::join!(router_task, http_task, matcher_task, reload_task);
        match router_result {
            Ok(Err(e)) => error!(error = %e, "event router failed"),
            Err(e) => error!(error = %e, "event router task panicked"),
            Ok(Ok(())) => {}
        }
        match http_result {
            Ok(Err(e)) => error!(error = %e, "command surface failed"),
            Err(e) => error!(error = %e, "command surface task panicked"),
            Ok(Ok(())) => {}
        }
        if let Err(e) = matcher_result {
            error!(error = %e, "match engine task panicked");
        }
        if let Err(e) = reload_result {
            error!(error = %e, "reload task panicked");
        }
    })
    .await;
    if drained.is_err() {
        warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "in-flight work did not finish before the drain timeout"
        );
    }

    close(archive.as_ref(), session.as_ref()).await;
    info!("facewatch shutdown complete");
    Ok(())
}

async fn close(archive: &dyn ArchiveAdapter, session: &dyn SessionClient) {
    if let Err(e) = archive.close().await {
        error!(error = %e, "failed to close archive");
    }
    if let Err(e) = session.disconnect().await {
        error!(error = %e, "failed to disconnect session");
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("facewatch={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
