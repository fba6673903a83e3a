// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! osmdbt-objectstore: the durable object-store collaborator (component
//! C2). Publishing a diff is a single `put_object` call against whatever
//! S3-compatible bucket the deployment points at; this crate's job is
//! to make that call boring — content-type inference and a canned ACL
//! are the only conveniences it adds on top of the bytes the caller
//! already has.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

pub mod metrics;
pub mod s3;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use metrics::ObjectStoreMetrics;

/// A chunked, possibly-lazy read of an object's contents.
pub type ObjectBody = BoxStream<'static, Result<Bytes, ObjectStoreError>>;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object store request failed: {0}")]
    Request(String),

    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("object store returned status {status} for {key}")]
    BadStatus { key: String, status: u16 },
}

/// Canned ACL applied to uploaded objects. Defaults to `PublicRead`,
/// matching the public replication mirror's access model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CannedAcl {
    #[default]
    PublicRead,
    Private,
}

impl CannedAcl {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            CannedAcl::PublicRead => "public-read",
            CannedAcl::Private => "private",
        }
    }
}

/// Every disk-adjacent collaborator above this one reaches the bucket
/// only through this trait: `get_object` streams bytes back,
/// `put_object` uploads a complete buffer with an optional ACL
/// override.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn get_object(&self, key: &str) -> Result<ObjectBody, ObjectStoreError>;

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        acl: Option<CannedAcl>,
    ) -> Result<(), ObjectStoreError>;
}

/// Infer a content-type from the key's trailing extension. Unknown
/// extensions return `None` so the caller omits the header entirely
/// rather than guessing.
pub fn infer_content_type(key: &str) -> Option<&'static str> {
    if key.ends_with(".osc.gz") {
        Some("application/gzip")
    } else if key.ends_with(".gz") {
        Some("application/gzip")
    } else if key.ends_with(".state.txt") || key.ends_with("state.txt") {
        Some("text/plain")
    } else if key.ends_with(".json") {
        Some("application/json")
    } else if key.ends_with(".txt") {
        Some("text/plain")
    } else {
        None
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
