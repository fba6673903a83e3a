// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! osmdbt-tools: the external-process collaborator (component C3).
//!
//! Wraps the four CLI tools a job shells out to — the log-cutter
//! (`osmdbt-get-log`), the diff-builder (`osmdbt-create-diff`), the
//! catchup tool (`osmdbt-catchup`), and the file inspector (`osmium
//! fileinfo`) — behind one trait so the engine never builds a `Command`
//! itself.

use async_trait::async_trait;
use osmdbt_core::ToolKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub mod metrics;
mod process;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use process::ProcessToolRunner;

/// Captured stdout from a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {command}: {source}")]
    Spawn { command: String, source: String },

    #[error("{command} exited with code {exit_code}: {message}")]
    NonZeroExit { command: String, exit_code: i32, message: String },

    #[error("{command} was terminated by a signal")]
    Signaled { command: String },
}

impl ToolError {
    /// Which exit-code bucket (100 vs 101) this failure maps to.
    pub fn kind(&self, tool: ToolKind) -> ToolKind {
        let _ = self;
        tool
    }
}

/// Deterministic argv construction: a fixed template plus global flags
/// appended in a stable order, so the same inputs always produce the
/// same command line.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Every external process a job runs goes through this trait.
#[async_trait]
pub trait ToolRunner: Send + Sync + 'static {
    async fn run_log_cutter(&self, config_path: &Path) -> Result<ToolOutput, ToolError>;
    async fn run_diff_builder(&self, config_path: &Path) -> Result<ToolOutput, ToolError>;
    async fn run_catchup(&self, config_path: &Path) -> Result<ToolOutput, ToolError>;
    async fn run_inspector(&self, target: &Path) -> Result<ToolOutput, ToolError>;
}

/// The binaries and flags a [`ProcessToolRunner`] invokes, mirroring
/// the `osmdbt.*`/`osmium.*` configuration keys.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub log_cutter: PathBuf,
    pub diff_builder: PathBuf,
    pub catchup: PathBuf,
    pub inspector: PathBuf,
    /// `osmdbt.getLogMaxChanges`, passed to the log-cutter as `-m`.
    pub max_changes: u32,
    /// `!osmdbt.verbose`: appends `-q` to log-cutter/diff-builder/catchup
    /// when true.
    pub quiet: bool,
    /// `osmium.verbose`: appends `--verbose` to the inspector when true.
    pub inspector_verbose: bool,
    /// `osmium.progress`: appends `--progress` when true, `--no-progress`
    /// otherwise.
    pub inspector_progress: bool,
    /// Hard wall-clock ceiling per invocation; exceeding it is reported
    /// as a [`ToolError::Signaled`].
    pub timeout: Duration,
}

fn argv_for(bin: &Path, extra: &[String]) -> ToolInvocation {
    ToolInvocation::new(bin, extra.to_vec())
}

pub(crate) fn log_cutter_invocation(paths: &ToolPaths, config_path: &Path) -> ToolInvocation {
    let mut args = vec!["-c".to_string(), config_path.to_string_lossy().into_owned()];
    if paths.quiet {
        args.push("-q".to_string());
    }
    args.push("-m".to_string());
    args.push(paths.max_changes.to_string());
    argv_for(&paths.log_cutter, &args)
}

pub(crate) fn diff_builder_invocation(paths: &ToolPaths, config_path: &Path) -> ToolInvocation {
    let mut args = vec!["-c".to_string(), config_path.to_string_lossy().into_owned()];
    if paths.quiet {
        args.push("-q".to_string());
    }
    argv_for(&paths.diff_builder, &args)
}

pub(crate) fn catchup_invocation(paths: &ToolPaths, config_path: &Path) -> ToolInvocation {
    let mut args = vec!["-c".to_string(), config_path.to_string_lossy().into_owned()];
    if paths.quiet {
        args.push("-q".to_string());
    }
    argv_for(&paths.catchup, &args)
}

pub(crate) fn inspector_invocation(paths: &ToolPaths, target: &Path) -> ToolInvocation {
    let mut args = Vec::new();
    if paths.inspector_verbose {
        args.push("--verbose".to_string());
    }
    args.push(if paths.inspector_progress { "--progress" } else { "--no-progress" }.to_string());
    args.push("--extended".to_string());
    args.push("--json".to_string());
    args.push(target.to_string_lossy().into_owned());
    ToolInvocation::new(&paths.inspector, {
        let mut full = vec!["fileinfo".to_string()];
        full.extend(args);
        full
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
