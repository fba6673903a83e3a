// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration histogram for external tool invocations, labeled by tool,
//! command, and exit code (`osmdbt_command_duration_seconds`, per
//! spec.md §6's `osmdbt_<tool>_command_duration_seconds{command,exitCode}`
//! family, with `tool` carried as a label rather than folded into the
//! metric name so the histogram can be registered once).

use prometheus::{HistogramVec, Registry};

#[derive(Debug, Clone)]
pub struct ToolMetrics {
    pub duration_seconds: HistogramVec,
}

impl ToolMetrics {
    pub fn register(registry: &Registry, buckets: &[f64]) -> prometheus::Result<Self> {
        let duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "osmdbt_command_duration_seconds",
                "Wall-clock duration of external tool invocations",
            )
            .buckets(buckets.to_vec()),
            &["tool", "command", "exit_code"],
        )?;
        registry.register(Box::new(duration_seconds.clone()))?;
        Ok(Self { duration_seconds })
    }

    /// A standalone instance for tests that don't need a shared registry.
    #[allow(clippy::expect_used)]
    pub fn standalone() -> Self {
        let duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "osmdbt_command_duration_seconds",
                "Wall-clock duration of external tool invocations",
            ),
            &["tool", "command", "exit_code"],
        )
        .expect("static metric descriptor is valid");
        Self { duration_seconds }
    }

    pub fn observe(&self, tool: &str, command: &str, exit_code: &str, seconds: f64) {
        self.duration_seconds.with_label_values(&[tool, command, exit_code]).observe(seconds);
    }
}
