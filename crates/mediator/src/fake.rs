// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Mediator`] for engine tests: a single global lock slot
//! plus an append-only action log.

use crate::{LeaseToken, Mediator, MediatorError};
use async_trait::async_trait;
use osmdbt_core::{ActionId, CreateActionRequest, JobId, UpdateActionRequest};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedAction {
    pub action_id: ActionId,
    pub create: CreateActionRequest,
    pub updates: Vec<UpdateActionRequest>,
}

#[derive(Default)]
pub struct FakeMediator {
    held: Mutex<Option<LeaseToken>>,
    deny_reservations: Mutex<bool>,
    actions: Mutex<Vec<RecordedAction>>,
    next_token: Mutex<u64>,
}

impl FakeMediator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_next_reservation(&self) {
        *self.deny_reservations.lock() = true;
    }

    pub fn is_locked(&self) -> bool {
        self.held.lock().is_some()
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.actions.lock().clone()
    }
}

#[async_trait]
impl Mediator for FakeMediator {
    async fn reserve_access(&self, _job_id: &JobId) -> Result<LeaseToken, MediatorError> {
        if std::mem::take(&mut *self.deny_reservations.lock()) {
            return Err(MediatorError::Denied { reason: "denied by test fixture".into() });
        }
        let mut held = self.held.lock();
        if held.is_some() {
            return Err(MediatorError::Denied { reason: "lock already held".into() });
        }
        let mut counter = self.next_token.lock();
        *counter += 1;
        let token = LeaseToken(format!("lease-{}", *counter));
        *held = Some(token.clone());
        Ok(token)
    }

    async fn create_action(&self, request: CreateActionRequest) -> Result<ActionId, MediatorError> {
        let action_id = ActionId::new();
        self.actions.lock().push(RecordedAction {
            action_id: action_id.clone(),
            create: request,
            updates: Vec::new(),
        });
        Ok(action_id)
    }

    async fn update_action(
        &self,
        action_id: &ActionId,
        request: UpdateActionRequest,
    ) -> Result<(), MediatorError> {
        let mut actions = self.actions.lock();
        let recorded = actions
            .iter_mut()
            .find(|a| &a.action_id == action_id)
            .ok_or_else(|| MediatorError::Request("unknown action id".into()))?;
        recorded.updates.push(request);
        Ok(())
    }

    async fn remove_lock(&self, lease: &LeaseToken) -> Result<(), MediatorError> {
        let mut held = self.held.lock();
        if held.as_ref() != Some(lease) {
            return Err(MediatorError::Denied { reason: "stale lease token".into() });
        }
        *held = None;
        Ok(())
    }
}
