// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory [`ToolRunner`] for engine tests.

use crate::{ToolError, ToolOutput, ToolRunner};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;

pub type ScriptedResult = Result<ToolOutput, ToolError>;

#[derive(Default)]
pub struct FakeToolRunner {
    log_cutter: Mutex<Vec<ScriptedResult>>,
    diff_builder: Mutex<Vec<ScriptedResult>>,
    catchup: Mutex<Vec<ScriptedResult>>,
    inspector: Mutex<Vec<ScriptedResult>>,
    pub calls: Mutex<Vec<&'static str>>,
}

fn pop_or_default(queue: &Mutex<Vec<ScriptedResult>>) -> ScriptedResult {
    let mut queue = queue.lock();
    if queue.is_empty() {
        Ok(ToolOutput::default())
    } else {
        queue.remove(0)
    }
}

impl FakeToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_log_cutter(&self, result: ScriptedResult) {
        self.log_cutter.lock().push(result);
    }

    pub fn push_diff_builder(&self, result: ScriptedResult) {
        self.diff_builder.lock().push(result);
    }

    pub fn push_catchup(&self, result: ScriptedResult) {
        self.catchup.lock().push(result);
    }

    pub fn push_inspector(&self, result: ScriptedResult) {
        self.inspector.lock().push(result);
    }
}

#[async_trait]
impl ToolRunner for FakeToolRunner {
    async fn run_log_cutter(&self, _config_path: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push("log_cutter");
        pop_or_default(&self.log_cutter)
    }

    async fn run_diff_builder(&self, _config_path: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push("diff_builder");
        pop_or_default(&self.diff_builder)
    }

    async fn run_catchup(&self, _config_path: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push("catchup");
        pop_or_default(&self.catchup)
    }

    async fn run_inspector(&self, _target: &Path) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push("inspector");
        pop_or_default(&self.inspector)
    }
}
