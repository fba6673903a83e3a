// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use osmdbt_core::SystemClock;
use osmdbt_fs::fake::FakeFilesystemStore;
use osmdbt_mediator::fake::FakeMediator;
use osmdbt_objectstore::fake::FakeObjectStore;
use osmdbt_tools::{ToolError, ToolOutput};
use std::path::Path;

/// A [`ToolRunner`] fake that actually mutates the staging filesystem
/// the way the real log-cutter/diff-builder/catchup binaries would, so
/// engine tests can exercise the full phase sequence without spawning
/// processes.
struct ScriptedTools {
    fs: Arc<FakeFilesystemStore>,
    staging: StagingTree,
    advance_to: Option<SequenceNumber>,
    catchup_fails: bool,
    inspector_json: Option<String>,
}

#[async_trait]
impl ToolRunner for ScriptedTools {
    async fn run_log_cutter(&self, _config_path: &Path) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::default())
    }

    async fn run_diff_builder(&self, _config_path: &Path) -> Result<ToolOutput, ToolError> {
        if let Some(end) = self.advance_to {
            let path = osmdbt_core::PublishPath::derive(end);
            let body = format!("sequenceNumber={end}\n");
            self.fs
                .write_file(&self.staging.state_file(), body.as_bytes())
                .await
                .expect("fake fs write never fails");
            self.fs
                .write_file(&self.staging.changes().join(path.diff_key()), b"diffbytes")
                .await
                .expect("fake fs write never fails");
            self.fs
                .write_file(&self.staging.changes().join(path.state_key()), body.as_bytes())
                .await
                .expect("fake fs write never fails");
        }
        Ok(ToolOutput::default())
    }

    async fn run_catchup(&self, _config_path: &Path) -> Result<ToolOutput, ToolError> {
        if self.catchup_fails {
            return Err(ToolError::NonZeroExit {
                command: "osmdbt-catchup".into(),
                exit_code: 1,
                message: "replication slot busy".into(),
            });
        }
        Ok(ToolOutput::default())
    }

    async fn run_inspector(&self, _target: &Path) -> Result<ToolOutput, ToolError> {
        match &self.inspector_json {
            Some(json) => Ok(ToolOutput { stdout: json.clone() }),
            None => Err(ToolError::NonZeroExit {
                command: "osmium".into(),
                exit_code: 1,
                message: "not configured".into(),
            }),
        }
    }
}

struct Harness {
    engine: JobEngine,
    fs: Arc<FakeFilesystemStore>,
    object_store: Arc<FakeObjectStore>,
    mediator: Arc<FakeMediator>,
}

fn build_harness(start_sequence: SequenceNumber, advance_to: Option<SequenceNumber>, catchup_fails: bool) -> Harness {
    let staging = StagingTree::new("/staging");
    let fs = Arc::new(FakeFilesystemStore::new());
    let object_store = Arc::new(FakeObjectStore::new());
    let mediator = Arc::new(FakeMediator::new());

    let pointer = format!("sequenceNumber={start_sequence}\n");
    futures_util_block_on(object_store.put_object(
        osmdbt_core::POINTER_KEY,
        bytes::Bytes::from(pointer.into_bytes()),
        None,
    ));

    let tools = Arc::new(ScriptedTools {
        fs: fs.clone(),
        staging: staging.clone(),
        advance_to,
        catchup_fails,
        inspector_json: None,
    });

    let config = JobEngineConfig { staging, tool_config_path: "/etc/osmdbt/config.toml".into(), should_collect_info: false };
    let engine = JobEngine::new(
        fs.clone(),
        object_store.clone(),
        tools,
        mediator.clone(),
        Arc::new(SystemClock),
        config,
        EngineMetrics::standalone(),
    );

    Harness { engine, fs, object_store, mediator }
}

/// Tests run single-threaded under `#[tokio::test]`; blocking on a
/// future that never actually suspends (an in-memory put) is safe here
/// and keeps harness setup synchronous.
fn futures_util_block_on<F: std::future::Future>(future: F) -> F::Output {
    futures_util::future::FutureExt::now_or_never(future)
        .expect("fake object store never suspends")
}

#[tokio::test]
async fn s1_happy_path_publishes_and_finalizes() {
    let harness = build_harness(665, Some(667), false);

    let outcome = harness.engine.execute_job().await;

    assert_eq!(outcome.exit_code, 0);
    assert!(!outcome.rollback);
    assert_eq!(outcome.sequence_start, Some(665));
    assert_eq!(outcome.sequence_end, Some(667));
    assert_eq!(outcome.state, JobState::Finalized);

    assert!(harness.object_store.contains("000/000/667.osc.gz"));
    assert!(harness.object_store.contains("000/000/667.state.txt"));
    let pointer = harness.object_store.get_bytes(osmdbt_core::POINTER_KEY).unwrap();
    assert_eq!(osmdbt_core::parse(std::str::from_utf8(&pointer).unwrap()).unwrap(), 667);
    assert!(!harness.mediator.is_locked());
}

#[tokio::test]
async fn s2_null_diff_takes_no_action() {
    let harness = build_harness(667, None, false);

    let outcome = harness.engine.execute_job().await;

    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.sequence_start, Some(667));
    assert_eq!(outcome.sequence_end, Some(667));
    assert!(harness.mediator.actions().is_empty());
    assert!(!harness.object_store.contains("000/000/667.osc.gz"));
}

#[tokio::test]
async fn s3_commit_failure_rolls_back() {
    let harness = build_harness(665, Some(667), true);

    let outcome = harness.engine.execute_job().await;

    assert_eq!(outcome.exit_code, 100);
    assert!(outcome.rollback);
    assert_eq!(outcome.sequence_end, Some(665));

    let pointer = harness.object_store.get_bytes(osmdbt_core::POINTER_KEY).unwrap();
    assert_eq!(osmdbt_core::parse(std::str::from_utf8(&pointer).unwrap()).unwrap(), 665);

    let actions = harness.mediator.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].updates.last().unwrap().outcome, osmdbt_core::ActionOutcome::Failed);
}

#[tokio::test]
async fn s4_rollback_failure_surfaces_the_more_severe_error() {
    let harness = build_harness(665, Some(667), true);
    // Occurrence 1 is `build_harness`'s seed put, occurrence 2 is
    // phase 10's publish put — both must succeed so the job reaches
    // commit and then rollback; only the rollback put (occurrence 3)
    // should fail.
    harness.object_store.fail_put_at(osmdbt_core::POINTER_KEY, 3);

    let outcome = harness.engine.execute_job().await;

    assert_eq!(outcome.exit_code, 104);
    assert!(outcome.rollback);
    assert_eq!(outcome.state, JobState::Aborted);

    // the pointer was never restored, so it's left wherever publish left it
    let pointer = harness.object_store.get_bytes(osmdbt_core::POINTER_KEY).unwrap();
    assert_eq!(osmdbt_core::parse(std::str::from_utf8(&pointer).unwrap()).unwrap(), 667);

    let actions = harness.mediator.actions();
    assert_eq!(actions[0].updates.last().unwrap().outcome, osmdbt_core::ActionOutcome::Failed);
}

#[tokio::test]
async fn s5_invalid_state_file_aborts_before_any_tool_runs() {
    let staging = StagingTree::new("/staging");
    let fs = Arc::new(FakeFilesystemStore::new());
    let object_store = Arc::new(FakeObjectStore::new());
    let mediator = Arc::new(FakeMediator::new());
    futures_util_block_on(object_store.put_object(
        osmdbt_core::POINTER_KEY,
        bytes::Bytes::from_static(b"garbage"),
        None,
    ));
    let tools = Arc::new(ScriptedTools {
        fs: fs.clone(),
        staging: staging.clone(),
        advance_to: None,
        catchup_fails: false,
        inspector_json: None,
    });
    let config = JobEngineConfig { staging, tool_config_path: "/etc/osmdbt/config.toml".into(), should_collect_info: false };
    let engine = JobEngine::new(
        fs,
        object_store.clone(),
        tools,
        mediator,
        Arc::new(SystemClock),
        config,
        EngineMetrics::standalone(),
    );

    let outcome = engine.execute_job().await;
    assert_eq!(outcome.exit_code, 102);
    assert!(!object_store.contains("000/000/000.osc.gz"));
}

#[tokio::test]
async fn single_flight_guard_rejects_a_job_while_one_is_already_active() {
    let harness = build_harness(665, Some(667), false);

    // Simulate a job already in flight on this instance without actually
    // running one, since the fakes resolve synchronously and would never
    // interleave two real `execute_job` calls.
    harness.engine.active.store(true, Ordering::SeqCst);

    let outcome = harness.engine.execute_job().await;
    assert!(outcome.already_active);
    assert_eq!(outcome.state, JobState::Idle);

    harness.engine.active.store(false, Ordering::SeqCst);
    let outcome = harness.engine.execute_job().await;
    assert!(!outcome.already_active);
    assert_eq!(outcome.exit_code, 0);
}
