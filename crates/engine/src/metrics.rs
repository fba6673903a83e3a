// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `osmdbt_job_count` and `osmdbt_job_duration_seconds{exitCode}`.

use prometheus::{HistogramVec, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub job_count: IntCounter,
    pub job_duration_seconds: HistogramVec,
}

impl EngineMetrics {
    pub fn register(registry: &Registry, buckets: &[f64]) -> prometheus::Result<Self> {
        let job_count = IntCounter::new("osmdbt_job_count", "Number of jobs started")?;
        registry.register(Box::new(job_count.clone()))?;

        let job_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "osmdbt_job_duration_seconds",
                "Wall-clock duration of a complete job, labeled by exit code",
            )
            .buckets(buckets.to_vec()),
            &["exit_code"],
        )?;
        registry.register(Box::new(job_duration_seconds.clone()))?;

        Ok(Self { job_count, job_duration_seconds })
    }

    #[allow(clippy::expect_used)]
    pub fn standalone() -> Self {
        Self {
            job_count: IntCounter::new("osmdbt_job_count", "Number of jobs started")
                .expect("static metric descriptor is valid"),
            job_duration_seconds: HistogramVec::new(
                prometheus::HistogramOpts::new(
                    "osmdbt_job_duration_seconds",
                    "Wall-clock duration of a complete job, labeled by exit code",
                ),
                &["exit_code"],
            )
            .expect("static metric descriptor is valid"),
        }
    }

    pub fn observe_job(&self, exit_code: i32, seconds: f64) {
        self.job_count.inc();
        self.job_duration_seconds.with_label_values(&[&exit_code.to_string()]).observe(seconds);
    }
}
