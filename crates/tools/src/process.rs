// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{
    catchup_invocation, diff_builder_invocation, inspector_invocation, log_cutter_invocation,
    metrics::ToolMetrics, ToolError, ToolInvocation, ToolOutput, ToolPaths, ToolRunner,
};
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;

/// Spawns the real CLI binaries via `tokio::process::Command`, capturing
/// stdout on success and stderr (or a synthetic message) on failure, and
/// recording a duration observation per invocation.
#[derive(Debug, Clone)]
pub struct ProcessToolRunner {
    paths: ToolPaths,
    metrics: ToolMetrics,
}

impl ProcessToolRunner {
    pub fn new(paths: ToolPaths, metrics: ToolMetrics) -> Self {
        Self { paths, metrics }
    }

    async fn run(&self, tool_label: &'static str, invocation: ToolInvocation) -> Result<ToolOutput, ToolError> {
        let command_line = invocation.command_line();
        let started = Instant::now();

        let spawn_result = tokio::time::timeout(
            self.paths.timeout,
            tokio::process::Command::new(&invocation.program).args(&invocation.args).output(),
        )
        .await;

        let output = match spawn_result {
            Err(_elapsed) => {
                self.metrics.observe(tool_label, &command_line, "timeout", started.elapsed().as_secs_f64());
                return Err(ToolError::Signaled { command: command_line });
            }
            Ok(Err(source)) => {
                self.metrics.observe(tool_label, &command_line, "spawn_error", started.elapsed().as_secs_f64());
                return Err(ToolError::Spawn { command: command_line, source: source.to_string() });
            }
            Ok(Ok(output)) => output,
        };

        let elapsed = started.elapsed().as_secs_f64();
        let exit_code = output.status.code();
        self.metrics.observe(
            tool_label,
            &command_line,
            &exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signaled".to_string()),
            elapsed,
        );

        match exit_code {
            Some(0) => Ok(ToolOutput { stdout: String::from_utf8_lossy(&output.stdout).into_owned() }),
            Some(code) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let message = if stderr.is_empty() {
                    format!("{tool_label} produced no diagnostic output")
                } else {
                    stderr
                };
                Err(ToolError::NonZeroExit { command: command_line, exit_code: code, message })
            }
            None => Err(ToolError::Signaled { command: command_line }),
        }
    }
}

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    async fn run_log_cutter(&self, config_path: &Path) -> Result<ToolOutput, ToolError> {
        self.run("log_cutter", log_cutter_invocation(&self.paths, config_path)).await
    }

    async fn run_diff_builder(&self, config_path: &Path) -> Result<ToolOutput, ToolError> {
        self.run("diff_builder", diff_builder_invocation(&self.paths, config_path)).await
    }

    async fn run_catchup(&self, config_path: &Path) -> Result<ToolOutput, ToolError> {
        self.run("catchup", catchup_invocation(&self.paths, config_path)).await
    }

    async fn run_inspector(&self, target: &Path) -> Result<ToolOutput, ToolError> {
        self.run("inspector", inspector_invocation(&self.paths, target)).await
    }
}
