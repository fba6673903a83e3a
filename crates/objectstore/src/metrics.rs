// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `osmdbt_objects_count{kind}` and `osmdbt_s3_error_count{kind}`.

use prometheus::{IntCounterVec, Opts, Registry};

#[derive(Debug, Clone)]
pub struct ObjectStoreMetrics {
    pub objects_count: IntCounterVec,
    pub s3_error_count: IntCounterVec,
}

impl ObjectStoreMetrics {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let objects_count = IntCounterVec::new(
            Opts::new("osmdbt_objects_count", "Number of object store requests, by operation kind"),
            &["kind"],
        )?;
        registry.register(Box::new(objects_count.clone()))?;

        let s3_error_count = IntCounterVec::new(
            Opts::new("osmdbt_s3_error_count", "Number of object store failures, by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(s3_error_count.clone()))?;

        Ok(Self { objects_count, s3_error_count })
    }

    /// A standalone instance for tests that don't need a shared registry.
    #[allow(clippy::expect_used)]
    pub fn standalone() -> Self {
        let objects_count = IntCounterVec::new(
            Opts::new("osmdbt_objects_count", "Number of object store requests, by operation kind"),
            &["kind"],
        )
        .expect("static metric descriptor is valid");
        let s3_error_count = IntCounterVec::new(
            Opts::new("osmdbt_s3_error_count", "Number of object store failures, by error kind"),
            &["kind"],
        )
        .expect("static metric descriptor is valid");
        Self { objects_count, s3_error_count }
    }

    pub fn record_request(&self, kind: &str) {
        self.objects_count.with_label_values(&[kind]).inc();
    }

    pub fn record_error(&self, kind: &str) {
        self.s3_error_count.with_label_values(&[kind]).inc();
    }
}
