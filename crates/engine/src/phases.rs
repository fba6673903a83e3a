// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fourteen phases of one job, numbered in execution order. Each
//! function owns exactly one phase; `JobEngine::run` chains them in
//! strict textual order.

use crate::{JobContext, JobEngine};
use bytes::Bytes;
use osmdbt_core::{
    CreateActionRequest, JobError, JobState, PublishPath, UpdateActionRequest,
};
use osmdbt_objectstore::ObjectStoreError;
use osmdbt_tools::ToolError;
use serde_json::Value;
use tracing::{info_span, warn, Instrument};

fn map_fs(err: osmdbt_fs::FSError) -> JobError {
    JobError::Filesystem(err.to_string())
}

fn map_store(err: ObjectStoreError) -> JobError {
    JobError::ObjectStore(err.to_string())
}

fn map_tool(err: ToolError) -> JobError {
    JobError::Tool { kind: osmdbt_core::ToolKind::Logger, source: err.to_string() }
}

async fn stream_to_string(
    mut body: osmdbt_objectstore::ObjectBody,
) -> Result<String, ObjectStoreError> {
    use futures_util::StreamExt;
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Phase 1: Reserve.
pub(crate) async fn reserve(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let lease = engine
            .mediator
            .reserve_access(&ctx.job.id)
            .await
            .map_err(|e| JobError::General(e.to_string()))?;
        ctx.lease = Some(lease);
        ctx.job.advance(JobState::Reserved);
        if let Some(callback) = &engine.on_reserved {
            callback();
        }
        Ok(())
    }
    .instrument(info_span!("reserve"))
    .await
}

/// Phase 2: Prepare. Creates the four staging directories, deduplicated
/// by string value, concurrently.
pub(crate) async fn prepare(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let mut dirs = engine.config.staging.dirs_to_create();
        dirs.sort();
        dirs.dedup();

        let results = futures_util::future::join_all(
            dirs.iter().map(|dir| engine.fs.mkdir_all(dir)),
        )
        .await;
        for result in results {
            result.map_err(map_fs)?;
        }

        ctx.job.advance(JobState::Prepared);
        Ok(())
    }
    .instrument(info_span!("prepare"))
    .await
}

/// Phase 3: Pull. Fetches the remote pointer and writes it to both the
/// working and backup copies concurrently.
pub(crate) async fn pull(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let body = engine.object_store.get_object(osmdbt_core::POINTER_KEY).await.map_err(map_store)?;
        let contents = stream_to_string(body).await.map_err(map_store)?;
        let bytes = Bytes::from(contents.into_bytes());

        let working = engine.config.staging.state_file();
        let backup = engine.config.staging.backup_state_file();

        let (a, b) = tokio::join!(
            engine.fs.write_file(&working, &bytes),
            engine.fs.write_file(&backup, &bytes),
        );
        a.map_err(map_fs)?;
        b.map_err(map_fs)?;

        ctx.job.advance(JobState::Staged);
        Ok(())
    }
    .instrument(info_span!("pull"))
    .await
}

/// Phase 4: Read start.
pub(crate) async fn read_start(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let text = engine.fs.read_file_text(&engine.config.staging.state_file()).await.map_err(map_fs)?;
        let sequence = osmdbt_core::parse(&text).map_err(|e| JobError::InvalidState(e.to_string()))?;
        ctx.job.sequence_start = Some(sequence);
        Ok(())
    }
    .instrument(info_span!("read_start"))
    .await
}

/// Phase 5: Produce. Log-cutter then diff-builder, sequentially.
pub(crate) async fn produce(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        engine.tools.run_log_cutter(&engine.config.tool_config_path).await.map_err(map_tool)?;
        engine.tools.run_diff_builder(&engine.config.tool_config_path).await.map_err(map_tool)?;
        ctx.job.advance(JobState::Produced);
        Ok(())
    }
    .instrument(info_span!("produce"))
    .await
}

/// Phase 6: Read end.
pub(crate) async fn read_end(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let text = engine.fs.read_file_text(&engine.config.staging.state_file()).await.map_err(map_fs)?;
        let sequence = osmdbt_core::parse(&text).map_err(|e| JobError::InvalidState(e.to_string()))?;
        ctx.job.sequence_end = Some(sequence);
        Ok(())
    }
    .instrument(info_span!("read_end"))
    .await
}

/// Phase 8: Announce.
pub(crate) async fn announce(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let end = ctx.job.sequence_end.ok_or_else(|| JobError::General("missing sequenceEnd before announce".into()))?;
        let action_id = engine
            .mediator
            .create_action(CreateActionRequest { state: end })
            .await
            .map_err(|e| JobError::General(e.to_string()))?;
        ctx.action_id = Some(action_id);
        Ok(())
    }
    .instrument(info_span!("announce"))
    .await
}

/// Phase 9: Release lease. Best-effort: failures are swallowed.
pub(crate) async fn release_lease_best_effort(engine: &JobEngine, ctx: &mut JobContext) {
    if let Some(lease) = ctx.lease.take() {
        if let Err(error) = engine.mediator.remove_lock(&lease).await {
            warn!(error = %error, "failed to release mediator lease; continuing");
        }
    }
}

/// Phase 10: Publish. No rollback may be triggered from here — the
/// pointer has not moved yet.
pub(crate) async fn publish(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let end = ctx.job.sequence_end.ok_or_else(|| JobError::General("missing sequenceEnd before publish".into()))?;
        let path = PublishPath::derive(end);

        let diff_bytes =
            engine.fs.read_file(&engine.config.staging.changes().join(path.diff_key())).await.map_err(map_fs)?;
        let state_bytes =
            engine.fs.read_file(&engine.config.staging.changes().join(path.state_key())).await.map_err(map_fs)?;

        let (diff_result, state_result) = tokio::join!(
            engine.object_store.put_object(&path.diff_key(), Bytes::from(diff_bytes), None),
            engine.object_store.put_object(&path.state_key(), Bytes::from(state_bytes), None),
        );
        diff_result.map_err(map_store)?;
        state_result.map_err(map_store)?;

        let pointer_bytes = engine.fs.read_file(&engine.config.staging.state_file()).await.map_err(map_fs)?;
        engine
            .object_store
            .put_object(osmdbt_core::POINTER_KEY, Bytes::from(pointer_bytes), None)
            .await
            .map_err(map_store)?;

        ctx.job.advance(JobState::Published);
        Ok(())
    }
    .instrument(info_span!("publish"))
    .await
}

/// Phase 11: Commit. Marks `.done` logs for catch-up and runs the
/// catchup tool. Its failure is the only trigger for rollback.
pub(crate) async fn commit(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let logs_dir = engine.config.staging.logs();
        let names = engine.fs.read_dir(&logs_dir).await.map_err(map_fs)?;
        let done: Vec<_> = names.into_iter().filter(|n| n.ends_with(".done")).collect();

        let renames = done.iter().map(|name| {
            let from = logs_dir.join(name);
            let to = logs_dir.join(name.trim_end_matches(".done"));
            engine.fs.rename(from.as_path(), to.as_path())
        });
        for result in futures_util::future::join_all(renames).await {
            result.map_err(map_fs)?;
        }

        engine.tools.run_catchup(&engine.config.tool_config_path).await.map_err(map_tool)?;

        ctx.job.advance(JobState::Committed);
        Ok(())
    }
    .instrument(info_span!("commit"))
    .await
}

/// Rollback sub-protocol (§4.5.a). Restores the remote pointer from the
/// pre-job backup; failure here is the most severe tagged error.
pub(crate) async fn rollback(engine: &JobEngine, ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        ctx.rollback = true;
        let backup = engine
            .fs
            .read_file(&engine.config.staging.backup_state_file())
            .await
            .map_err(|e| JobError::Rollback(e.to_string()))?;

        engine
            .object_store
            .put_object(osmdbt_core::POINTER_KEY, Bytes::from(backup), None)
            .await
            .map_err(|e| JobError::Rollback(e.to_string()))?;

        ctx.job.sequence_end = ctx.job.sequence_start;
        ctx.job.advance(JobState::RolledBack);
        Ok(())
    }
    .instrument(info_span!("rollback"))
    .await
}

/// Phase 12: Post-catchup cleanup. Errors fail the job but never
/// trigger rollback — the pointer and replication slot have already
/// both advanced.
pub(crate) async fn cleanup(engine: &JobEngine, _ctx: &mut JobContext) -> Result<(), JobError> {
    async {
        let logs_dir = engine.config.staging.logs();
        let names = engine.fs.read_dir(&logs_dir).await.map_err(map_fs)?;
        let unlinks = names.iter().map(|name| engine.fs.unlink(logs_dir.join(name).as_path()));
        for result in futures_util::future::join_all(unlinks).await {
            result.map_err(map_fs)?;
        }
        Ok(())
    }
    .instrument(info_span!("cleanup"))
    .await
}

/// Phase 13: Collect info. Always best-effort, regardless of
/// `should_collect_info`'s configuration intent beyond the gate itself
/// — exit code 101 is reserved for a mandatory mode no deployment
/// currently enables.
pub(crate) async fn collect_info_best_effort(engine: &JobEngine, ctx: &mut JobContext) -> Option<Value> {
    if !engine.config.should_collect_info {
        return None;
    }
    let end = ctx.job.sequence_end?;
    let path = PublishPath::derive(end);
    let diff_path = engine.config.staging.changes().join(path.diff_key());

    async {
        match engine.tools.run_inspector(&diff_path).await {
            Ok(output) => match serde_json::from_str::<Value>(&output.stdout) {
                Ok(value) => Some(value),
                Err(error) => {
                    warn!(error = %error, "inspector output was not valid json; dropping");
                    None
                }
            },
            Err(error) => {
                warn!(error = %error, "inspector failed; continuing best-effort");
                None
            }
        }
    }
    .instrument(info_span!("collect_info"))
    .await
}

/// Best-effort `updateAction(FAILED, ...)` on any post-announce error
/// path. Leaves the job state alone if rollback already moved it to
/// `RolledBack` — that is the more specific terminal state.
pub(crate) async fn fail_action_best_effort(engine: &JobEngine, ctx: &mut JobContext, error: &JobError) {
    let Some(action_id) = ctx.action_id.as_ref() else { return };
    if let Err(update_error) =
        engine.mediator.update_action(action_id, UpdateActionRequest::failed(error.to_string())).await
    {
        warn!(error = %update_error, "failed to mark mediator action as failed");
    }
    if ctx.job.state != JobState::RolledBack {
        ctx.job.advance(JobState::Aborted);
    }
}

/// Phase 14: Finalize.
pub(crate) async fn finalize(engine: &JobEngine, ctx: &mut JobContext, info: Option<Value>) -> Result<(), JobError> {
    async {
        let action_id = ctx.action_id.clone().ok_or_else(|| JobError::General("missing action id at finalize".into()))?;
        let request = UpdateActionRequest::completed(info.map(|info| serde_json::json!({ "info": info })));

        engine
            .mediator
            .update_action(&action_id, request)
            .await
            .map_err(|e| JobError::General(e.to_string()))?;

        ctx.job.advance(JobState::Finalized);
        Ok(())
    }
    .instrument(info_span!("finalize"))
    .await
}
