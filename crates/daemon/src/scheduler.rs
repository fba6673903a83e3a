// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot and cron scheduling glue around [`osmdbt_engine::JobEngine`].
//!
//! The engine's own single-flight guard keeps a long job from being
//! re-entered, but the cron loop never even attempts an overlapping
//! tick: each iteration awaits the previous job's `execute_job` future
//! to completion before computing the next fire time.

use crate::health::Liveness;
use cron::Schedule;
use osmdbt_engine::{JobEngine, JobOutcome};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron expression {expression:?}: {source}")]
    InvalidExpression { expression: String, source: cron::error::Error },
}

/// Run exactly one job then return its outcome.
pub async fn run_one_shot(engine: Arc<JobEngine>, liveness: Arc<Liveness>) -> JobOutcome {
    let outcome = engine.execute_job().await;
    liveness.mark_ready();
    outcome
}

/// Resolves once either SIGINT or SIGTERM is received.
pub async fn shutdown_requested() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(error) => {
            error!(%error, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(error) => {
            error!(%error, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
            unreachable!()
        }
    };
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
}

/// Drive the engine on a cron schedule until shutdown is requested.
///
/// On job failure, sleeps `failure_penalty` before the next tick is
/// accepted. The hard safety timer that bounds how long a shutdown may
/// wait for an in-flight job lives in `main`, one layer up.
pub async fn run_cron(
    engine: Arc<JobEngine>,
    liveness: Arc<Liveness>,
    expression: &str,
    failure_penalty: Duration,
) -> Result<(), SchedulerError> {
    let schedule = Schedule::from_str(expression)
        .map_err(|source| SchedulerError::InvalidExpression { expression: expression.to_string(), source })?;

    tokio::pin! {
        let shutdown = shutdown_requested();
    }

    loop {
        let Some(next_fire) = schedule.upcoming(chrono::Utc).next() else {
            warn!("cron schedule has no further occurrences; stopping");
            return Ok(());
        };
        let now = chrono::Utc::now();
        let delay = (next_fire - now).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = &mut shutdown => {
                info!("shutdown requested before next tick; stopping scheduler");
                return Ok(());
            }
        }

        let outcome = engine.execute_job().await;
        liveness.mark_ready();

        if outcome.already_active {
            continue;
        }
        if outcome.exit_code != 0 {
            warn!(exit_code = outcome.exit_code, "job failed; sleeping failure penalty before next tick");
            tokio::select! {
                _ = tokio::time::sleep(failure_penalty) => {}
                _ = &mut shutdown => {
                    info!("shutdown requested during failure penalty; stopping scheduler");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
