// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! osmdbt-mediator: the cross-service coordination collaborator
//! (component C5). Every replica of the job engine talks to the same
//! mediator, so it is the single source of truth for "who is allowed to
//! publish right now" and "what happened in the last N jobs".

use async_trait::async_trait;
use osmdbt_core::{ActionId, CreateActionRequest, JobId, UpdateActionRequest};
use thiserror::Error;

pub mod http;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

/// Opaque lease handle returned by `reserve_access`. Holding one is what
/// lets a job proceed past the Reserve phase; releasing it (via
/// `remove_lock`) is the last step before a job is Finalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseToken(pub String);

impl std::fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum MediatorError {
    #[error("mediator request failed: {0}")]
    Request(String),

    #[error("access reservation denied: {reason}")]
    Denied { reason: String },

    #[error("mediator returned status {0}")]
    BadStatus(u16),
}

/// Cross-service coordination: a lease gate plus a log of actions keyed
/// by action id, not by lease. The lease only gates `reserve_access` /
/// `remove_lock` — `create_action` and `update_action` are routinely
/// called after the lease has already been released (phases 10 and 14
/// both follow phase 9's release).
#[async_trait]
pub trait Mediator: Send + Sync + 'static {
    async fn reserve_access(&self, job_id: &JobId) -> Result<LeaseToken, MediatorError>;

    async fn create_action(&self, request: CreateActionRequest) -> Result<ActionId, MediatorError>;

    async fn update_action(
        &self,
        action_id: &ActionId,
        request: UpdateActionRequest,
    ) -> Result<(), MediatorError>;

    async fn remove_lock(&self, lease: &LeaseToken) -> Result<(), MediatorError>;
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
