// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared error taxonomy driving process exit-code classification.
//! Every collaborator crate (`osmdbt-fs`, `osmdbt-objectstore`,
//! `osmdbt-tools`, `osmdbt-mediator`) defines its own narrow error enum;
//! `JobError` is how `osmdbt-engine` folds all of them into the
//! operator-visible taxonomy and picks an exit code.

use thiserror::Error;

/// Which external tool a [`JobError::Tool`] failure came from, so the
/// engine can pick between exit codes 100 and 101.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Log-cutter, diff-builder, or catchup (osmdbt-get-log / osmdbt-create-diff / osmdbt-catchup).
    Logger,
    /// The file introspector (osmium fileinfo).
    Inspector,
}

/// The top-level tagged error kinds.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("unclassified error: {0}")]
    General(String),

    #[error("tool failure: {0}")]
    Tool { kind: ToolKind, source: String },

    #[error("inspector failure: {0}")]
    Inspector(String),

    #[error("state file unparseable: {0}")]
    InvalidState(String),

    #[error("rollback failed, manual intervention required: {0}")]
    Rollback(String),

    #[error("object store error: {0}")]
    ObjectStore(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("terminated by signal")]
    Terminated,
}

impl JobError {
    /// Process exit code. `RollbackError` supersedes all others —
    /// callers combining multiple observed errors should prefer the
    /// maximum-severity one, and `Rollback` always wins that compare.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobError::General(_) => 1,
            JobError::Tool { kind: ToolKind::Logger, .. } => 100,
            JobError::Tool { kind: ToolKind::Inspector, .. } => 101,
            JobError::Inspector(_) => 101,
            JobError::InvalidState(_) => 102,
            JobError::Rollback(_) => 104,
            JobError::ObjectStore(_) => 105,
            JobError::Filesystem(_) => 107,
            JobError::Terminated => 130,
        }
    }

    /// Short tag used in structured log lines, e.g. `error.kind=S3Error`.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            JobError::General(_) => "GeneralError",
            JobError::Tool { kind: ToolKind::Logger, .. } => "ToolError",
            JobError::Tool { kind: ToolKind::Inspector, .. } => "InspectorError",
            JobError::Inspector(_) => "InspectorError",
            JobError::InvalidState(_) => "InvalidStateError",
            JobError::Rollback(_) => "RollbackError",
            JobError::ObjectStore(_) => "S3Error",
            JobError::Filesystem(_) => "FSError",
            JobError::Terminated => "Terminated",
        }
    }
}

/// Pick the maximum-severity error among those observed during a job.
/// The final exit code is the maximum-severity error observed;
/// `RollbackError` supersedes all others.
pub fn max_severity<'a>(errors: impl IntoIterator<Item = &'a JobError>) -> Option<&'a JobError> {
    errors.into_iter().max_by_key(|e| severity_rank(e))
}

fn severity_rank(e: &JobError) -> u8 {
    match e {
        JobError::Rollback(_) => 255,
        JobError::ObjectStore(_) => 90,
        JobError::Filesystem(_) => 89,
        JobError::Tool { kind: ToolKind::Logger, .. } => 80,
        JobError::InvalidState(_) => 70,
        JobError::Tool { kind: ToolKind::Inspector, .. } | JobError::Inspector(_) => 10,
        JobError::General(_) => 5,
        JobError::Terminated => 200,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
