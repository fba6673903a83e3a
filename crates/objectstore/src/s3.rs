// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin reqwest-based client against an S3-compatible HTTP endpoint.
//!
//! This intentionally does not implement SigV4 signing, multipart
//! upload, or bucket lifecycle management — the deployment is expected
//! to front the bucket with a pre-authorized endpoint (e.g. a presigned
//! base URL or a sidecar proxy).

use crate::{infer_content_type, CannedAcl, ObjectBody, ObjectStore, ObjectStoreError, ObjectStoreMetrics};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

/// Configuration needed to address objects in the bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Base URL the bucket is reachable at, e.g.
    /// `https://replication.example.com`. Keys are appended verbatim.
    pub base_url: String,
    pub default_acl: CannedAcl,
    /// Passed through as HTTP basic auth. No SigV4 signing is performed
    /// (see the module doc) — the deployment's endpoint is expected to
    /// accept these credentials directly.
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: reqwest::Client,
    config: S3Config,
    metrics: ObjectStoreMetrics,
}

impl S3ObjectStore {
    pub fn new(client: reqwest::Client, config: S3Config, metrics: ObjectStoreMetrics) -> Self {
        Self { client, config, metrics }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), key.trim_start_matches('/'))
    }

    fn error_kind(error: &ObjectStoreError) -> &'static str {
        match error {
            ObjectStoreError::Request(_) => "request",
            ObjectStoreError::NotFound { .. } => "not_found",
            ObjectStoreError::BadStatus { .. } => "bad_status",
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, key: &str) -> Result<ObjectBody, ObjectStoreError> {
        self.metrics.record_request("get");
        let result = self.get_object_inner(key).await;
        if let Err(error) = &result {
            self.metrics.record_error(Self::error_kind(error));
        }
        result
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        acl: Option<CannedAcl>,
    ) -> Result<(), ObjectStoreError> {
        self.metrics.record_request("put");
        let result = self.put_object_inner(key, bytes, acl).await;
        if let Err(error) = &result {
            self.metrics.record_error(Self::error_kind(error));
        }
        result
    }
}

impl S3ObjectStore {
    async fn get_object_inner(&self, key: &str) -> Result<ObjectBody, ObjectStoreError> {
        let response = self
            .client
            .get(self.url_for(key))
            .basic_auth(&self.config.access_key, Some(&self.config.secret_key))
            .send()
            .await
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound { key: key.to_string() });
        }
        if !response.status().is_success() {
            return Err(ObjectStoreError::BadStatus { key: key.to_string(), status: response.status().as_u16() });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ObjectStoreError::Request(e.to_string())));
        Ok(Box::pin(stream))
    }

    async fn put_object_inner(
        &self,
        key: &str,
        bytes: Bytes,
        acl: Option<CannedAcl>,
    ) -> Result<(), ObjectStoreError> {
        let acl = acl.unwrap_or(self.config.default_acl);
        let mut request = self
            .client
            .put(self.url_for(key))
            .basic_auth(&self.config.access_key, Some(&self.config.secret_key))
            .header("x-amz-acl", acl.as_header_value());
        if let Some(content_type) = infer_content_type(key) {
            request = request.header("content-type", content_type);
        }
        let response = request
            .body(bytes)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ObjectStoreError::BadStatus { key: key.to_string(), status: response.status().as_u16() });
        }
        Ok(())
    }
}
