// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mediator-owned `Action` record — one attempt to advance the
//! sequence from `S` to `S'`. The mediator is an external collaborator
//! (see [`crate`] crate docs and `osmdbt-mediator`); this module only
//! defines the shared vocabulary both sides agree on.

use crate::sequence::SequenceNumber;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Identifier for an action record, as assigned by the mediator.
    pub struct ActionId("act-");
}

/// Final disposition of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionOutcome {
    Completed,
    Failed,
}

crate::simple_display! {
    ActionOutcome {
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

/// Payload sent to the mediator when creating an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActionRequest {
    pub state: SequenceNumber,
}

/// Payload sent to the mediator when transitioning an action to its
/// terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActionRequest {
    pub outcome: ActionOutcome,
    /// `metadata.info` on success, `metadata.error` on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl UpdateActionRequest {
    pub fn completed(info: Option<Value>) -> Self {
        Self { outcome: ActionOutcome::Completed, metadata: info }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            outcome: ActionOutcome::Failed,
            metadata: Some(serde_json::json!({ "error": error.into() })),
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
