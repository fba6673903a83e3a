// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! osmdbtd: scheduled worker that drives one OSM replication job per
//! tick. Single entry point, no subcommands — behavior is controlled
//! entirely by the config file.

mod config;
mod env;
mod health;
mod logging;
mod scheduler;

use config::Config;
use osmdbt_engine::{EngineMetrics, JobEngine, JobEngineConfig};
use osmdbt_fs::{LocalFilesystemStore, StagingTree};
use osmdbt_mediator::http::MediatorHttpClient;
use osmdbt_mediator::Mediator;
use osmdbt_objectstore::s3::{S3Config, S3ObjectStore};
use osmdbt_objectstore::{CannedAcl, ObjectStoreMetrics};
use osmdbt_tools::metrics::ToolMetrics;
use osmdbt_tools::{ProcessToolRunner, ToolPaths};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config_path = env::config_path();
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("failed to load config from {}: {error}", config_path.display());
            std::process::exit(1);
        }
    };

    let log_path = env::log_path();
    logging::rotate_log_if_needed(&log_path);
    let _log_guard = match logging::setup_logging(&log_path, &config.telemetry.logger) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("failed to initialize logging at {}: {error}", log_path.display());
            std::process::exit(1);
        }
    };

    info!(config = %config_path.display(), cron_enabled = config.app.cron.enabled, "osmdbtd starting");

    let shutdown_timeout = Duration::from_secs(env::shutdown_timeout_seconds());
    spawn_hard_safety_timer(shutdown_timeout);

    let registry = Registry::new();
    let engine_metrics = match EngineMetrics::register(
        &registry,
        &config.telemetry.metrics.buckets.osmdbt_job_duration_seconds,
    ) {
        Ok(metrics) => metrics,
        Err(error) => {
            error!(%error, "failed to register engine metrics");
            std::process::exit(1);
        }
    };
    let tool_metrics = match ToolMetrics::register(
        &registry,
        &config.telemetry.metrics.buckets.osmdbt_command_duration_seconds,
    ) {
        Ok(metrics) => metrics,
        Err(error) => {
            error!(%error, "failed to register tool metrics");
            std::process::exit(1);
        }
    };
    let object_store_metrics = match ObjectStoreMetrics::register(&registry) {
        Ok(metrics) => metrics,
        Err(error) => {
            error!(%error, "failed to register object store metrics");
            std::process::exit(1);
        }
    };

    let staging = staging_tree(&config);
    let tool_paths = ToolPaths {
        log_cutter: config.osmdbt.bin_dir.join("osmdbt-get-log"),
        diff_builder: config.osmdbt.bin_dir.join("osmdbt-create-diff"),
        catchup: config.osmdbt.bin_dir.join("osmdbt-catchup"),
        inspector: "osmium".into(),
        max_changes: config.osmdbt.get_log_max_changes,
        quiet: !config.osmdbt.verbose,
        inspector_verbose: config.osmium.verbose,
        inspector_progress: config.osmium.progress,
        // Tool invocations have no soft timeout of their own; only the
        // hard safety timer above bounds how long shutdown may wait.
        // This ceiling exists purely as a last-resort guard against a
        // wedged subprocess that never exits.
        timeout: Duration::from_secs(24 * 60 * 60),
    };
    let tools = Arc::new(ProcessToolRunner::new(tool_paths, tool_metrics));

    let http_client = reqwest::Client::new();
    let object_store = Arc::new(S3ObjectStore::new(
        http_client.clone(),
        S3Config {
            base_url: config.object_storage.endpoint.clone(),
            default_acl: parse_acl(&config.object_storage.acl),
            access_key: config.object_storage.credentials.access_key.clone(),
            secret_key: config.object_storage.credentials.secret_key.clone(),
        },
        object_store_metrics,
    ));
    let mediator: Arc<dyn Mediator> =
        Arc::new(MediatorHttpClient::new(http_client, config.arstotzka.mediator.base_url.clone()));

    let engine_config = JobEngineConfig {
        staging,
        tool_config_path: config_path.clone(),
        should_collect_info: config.app.should_collect_info,
    };
    let engine = Arc::new(JobEngine::new(
        Arc::new(LocalFilesystemStore),
        object_store,
        tools,
        mediator,
        Arc::new(osmdbt_core::SystemClock),
        engine_config,
        engine_metrics,
    ));

    let liveness = health::Liveness::new();
    let liveness_addr = env::liveness_addr();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let liveness_task = tokio::spawn(health::serve(liveness_addr, liveness.clone(), registry, async {
        let _ = shutdown_rx.await;
    }));

    let exit_code = if config.app.cron.enabled {
        run_cron_mode(engine, liveness, &config).await
    } else {
        scheduler::run_one_shot(engine, liveness).await.exit_code
    };

    let _ = shutdown_tx.send(());
    if tokio::time::timeout(shutdown_timeout, liveness_task).await.is_err() {
        warn!("liveness server did not shut down within the hard safety timer");
    }

    std::process::exit(exit_code);
}

/// Races the process against its own shutdown: once a SIGINT/SIGTERM is
/// observed, self-terminate after `timeout` even if the scheduler's own
/// graceful shutdown (which waits for an in-flight job to reach a phase
/// boundary) never returns.
fn spawn_hard_safety_timer(timeout: Duration) {
    tokio::spawn(async move {
        scheduler::shutdown_requested().await;
        tokio::time::sleep(timeout).await;
        error!("hard safety timer elapsed after shutdown request; force-terminating");
        std::process::exit(130);
    });
}

/// The configured `changesDir`/`runDir`/`logDir` are expected to be
/// sibling subdirectories of one staging root; derive that root from
/// `changesDir` and warn if the other two don't match the canonical
/// layout.
fn staging_tree(config: &Config) -> StagingTree {
    let root = config
        .osmdbt
        .changes_dir
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.osmdbt.changes_dir.clone());
    let expected_logs = root.join("logs");
    let expected_run = root.join("run");
    if config.osmdbt.log_dir != expected_logs || config.osmdbt.run_dir != expected_run {
        warn!(
            configured_logs = %config.osmdbt.log_dir.display(),
            configured_run = %config.osmdbt.run_dir.display(),
            canonical_logs = %expected_logs.display(),
            canonical_run = %expected_run.display(),
            "logDir/runDir are not siblings of changesDir; using the canonical layout derived from changesDir's parent",
        );
    }
    StagingTree::new(root)
}

fn parse_acl(acl: &str) -> CannedAcl {
    match acl {
        "private" => CannedAcl::Private,
        _ => CannedAcl::PublicRead,
    }
}

async fn run_cron_mode(engine: Arc<JobEngine>, liveness: Arc<health::Liveness>, config: &Config) -> i32 {
    let penalty = Duration::from_secs(config.app.cron.failure_penalty_seconds);
    match scheduler::run_cron(engine, liveness, &config.app.cron.expression, penalty).await {
        Ok(()) => 0,
        Err(error) => {
            error!(%error, "cron scheduler failed to start");
            1
        }
    }
}
