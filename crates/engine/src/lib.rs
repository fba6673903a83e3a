// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! osmdbt-engine: the job-execution state machine (component C6).
//!
//! Composes [`osmdbt_fs::FilesystemStore`], [`osmdbt_objectstore::ObjectStore`],
//! [`osmdbt_tools::ToolRunner`], and [`osmdbt_mediator::Mediator`] into the
//! fourteen-phase replication job protocol, including rollback and the
//! single-flight guard that keeps at most one job live per process.

use osmdbt_core::{Clock, Job, JobError, JobState, SequenceNumber};
use osmdbt_fs::{FilesystemStore, StagingTree};
use osmdbt_mediator::Mediator;
use osmdbt_objectstore::ObjectStore;
use osmdbt_tools::ToolRunner;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

pub mod metrics;
mod phases;

pub use metrics::EngineMetrics;

/// Static configuration for one [`JobEngine`] instance; stable for the
/// life of the process.
#[derive(Debug, Clone)]
pub struct JobEngineConfig {
    pub staging: StagingTree,
    /// Config file path handed to every tool invocation (`-c <path>`).
    pub tool_config_path: PathBuf,
    /// Whether phase 13 (inspector) runs at all. Its failure is always
    /// best-effort regardless of this flag.
    pub should_collect_info: bool,
}

/// Outcome of one `execute_job` call, including the degenerate
/// already-active case.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub state: JobState,
    pub exit_code: i32,
    pub rollback: bool,
    pub sequence_start: Option<SequenceNumber>,
    pub sequence_end: Option<SequenceNumber>,
    pub already_active: bool,
}

impl JobOutcome {
    fn already_active() -> Self {
        Self {
            state: JobState::Idle,
            exit_code: 0,
            rollback: false,
            sequence_start: None,
            sequence_end: None,
            already_active: true,
        }
    }
}

pub(crate) struct JobContext {
    pub job: Job,
    pub lease: Option<osmdbt_mediator::LeaseToken>,
    pub action_id: Option<osmdbt_core::ActionId>,
    pub rollback: bool,
}

impl JobContext {
    fn new() -> Self {
        Self { job: Job::new(), lease: None, action_id: None, rollback: false }
    }
}

/// The state machine driving one replication job from lease acquisition
/// to publication and catch-up.
pub struct JobEngine {
    pub(crate) fs: Arc<dyn FilesystemStore>,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) tools: Arc<dyn ToolRunner>,
    pub(crate) mediator: Arc<dyn Mediator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: JobEngineConfig,
    pub(crate) metrics: EngineMetrics,
    /// Fired once phase 1 (reserve) has completed successfully, for the
    /// first time on this instance. Lets a liveness probe report ready
    /// only after the engine has proven it can talk to the mediator.
    pub(crate) on_reserved: Option<Arc<dyn Fn() + Send + Sync>>,
    active: AtomicBool,
}

impl JobEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fs: Arc<dyn FilesystemStore>,
        object_store: Arc<dyn ObjectStore>,
        tools: Arc<dyn ToolRunner>,
        mediator: Arc<dyn Mediator>,
        clock: Arc<dyn Clock>,
        config: JobEngineConfig,
        metrics: EngineMetrics,
    ) -> Self {
        Self {
            fs,
            object_store,
            tools,
            mediator,
            clock,
            config,
            metrics,
            on_reserved: None,
            active: AtomicBool::new(false),
        }
    }

    /// Attach a callback invoked the first time phase 1 succeeds.
    pub fn with_on_reserved(mut self, callback: Arc<dyn Fn() + Send + Sync>) -> Self {
        self.on_reserved = Some(callback);
        self
    }

    /// Run one job to completion. Returns immediately with
    /// `already_active = true` if a job is already in flight on this
    /// instance.
    pub async fn execute_job(&self) -> JobOutcome {
        if self.active.swap(true, Ordering::SeqCst) {
            warn!("job engine is already active; skipping this tick");
            return JobOutcome::already_active();
        }
        let _release = ActiveGuard(&self.active);

        let mut ctx = JobContext::new();
        let started = Instant::now();
        let job_id = ctx.job.id;

        let span = info_span!("job", job.id = %job_id);

        let outcome = self.run(&mut ctx).instrument(span.clone()).await;

        let exit_code = match &outcome {
            Ok(()) => 0,
            Err(error) => error.exit_code(),
        };

        let _entered = span.enter();
        info!(
            job.rollback = ctx.rollback,
            job.state.start = ctx.job.sequence_start.unwrap_or_default(),
            job.state.end = ctx.job.sequence_end.unwrap_or_default(),
            job.exitcode = exit_code,
            "job finished",
        );

        self.metrics.observe_job(exit_code, started.elapsed().as_secs_f64());

        if let Err(error) = &outcome {
            info!(error = %error, error.kind = error.kind_tag(), "job failed");
        }
        drop(_entered);

        JobOutcome {
            state: ctx.job.state,
            exit_code,
            rollback: ctx.rollback,
            sequence_start: ctx.job.sequence_start,
            sequence_end: ctx.job.sequence_end,
            already_active: false,
        }
    }

    /// The fourteen-phase protocol, plus the rollback branch on commit
    /// failure. Every non-best-effort error short-circuits here and is
    /// classified by the caller.
    async fn run(&self, ctx: &mut JobContext) -> Result<(), JobError> {
        phases::reserve(self, ctx).await?;
        phases::prepare(self, ctx).await?;
        phases::pull(self, ctx).await?;
        phases::read_start(self, ctx).await?;
        phases::produce(self, ctx).await?;
        phases::read_end(self, ctx).await?;

        if ctx.job.is_null_diff() {
            phases::release_lease_best_effort(self, ctx).await;
            return Ok(());
        }

        phases::announce(self, ctx).await?;
        phases::release_lease_best_effort(self, ctx).await;

        if let Err(error) = phases::publish(self, ctx).await {
            phases::fail_action_best_effort(self, ctx, &error).await;
            return Err(error);
        }

        if let Err(commit_error) = phases::commit(self, ctx).await {
            if let Err(rollback_error) = phases::rollback(self, ctx).await {
                phases::fail_action_best_effort(self, ctx, &rollback_error).await;
                return Err(rollback_error);
            }
            phases::fail_action_best_effort(self, ctx, &commit_error).await;
            return Err(commit_error);
        }

        if let Err(error) = phases::cleanup(self, ctx).await {
            phases::fail_action_best_effort(self, ctx, &error).await;
            return Err(error);
        }

        let info = phases::collect_info_best_effort(self, ctx).await;

        if let Err(error) = phases::finalize(self, ctx, info).await {
            phases::fail_action_best_effort(self, ctx, &error).await;
            return Err(error);
        }

        Ok(())
    }
}

struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
