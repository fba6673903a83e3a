// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory object store for engine and daemon tests.

use crate::{CannedAcl, ObjectBody, ObjectStore, ObjectStoreError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct FakeObjectStore {
    objects: Mutex<BTreeMap<String, (Bytes, Option<CannedAcl>)>>,
    /// key -> 1-indexed occurrence of `put_object` that should fail.
    fail_at_occurrence: Mutex<BTreeMap<String, usize>>,
    /// key -> number of `put_object` calls observed so far.
    put_counts: Mutex<BTreeMap<String, usize>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().contains_key(key)
    }

    /// Make the next `put_object` call for `key` fail once, to exercise
    /// rollback-of-rollback paths (S4).
    pub fn fail_next_put(&self, key: &str) {
        self.fail_put_at(key, 1);
    }

    /// Make the `occurrence`-th (1-indexed) `put_object` call for `key`
    /// fail once. Every other call for `key` succeeds normally. Used to
    /// target a specific write in a key's history, e.g. the rollback put
    /// to `state.txt` rather than the preceding publish put.
    pub fn fail_put_at(&self, key: &str, occurrence: usize) {
        self.fail_at_occurrence.lock().insert(key.to_string(), occurrence);
    }

    pub fn acl_of(&self, key: &str) -> Option<CannedAcl> {
        self.objects.lock().get(key).and_then(|(_, acl)| *acl)
    }

    pub fn get_bytes(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().get(key).map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn get_object(&self, key: &str) -> Result<ObjectBody, ObjectStoreError> {
        let bytes = self
            .objects
            .lock()
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| ObjectStoreError::NotFound { key: key.to_string() })?;
        Ok(Box::pin(futures_util::stream::once(async move { Ok(bytes) })))
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Bytes,
        acl: Option<CannedAcl>,
    ) -> Result<(), ObjectStoreError> {
        let count = {
            let mut counts = self.put_counts.lock();
            let count = counts.entry(key.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if self.fail_at_occurrence.lock().get(key) == Some(&count) {
            self.fail_at_occurrence.lock().remove(key);
            return Err(ObjectStoreError::Request(format!("injected failure writing {key}")));
        }
        self.objects.lock().insert(key.to_string(), (bytes, acl));
        Ok(())
    }
}
