// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::FakeMediator;
use osmdbt_core::{ActionOutcome, CreateActionRequest, JobId};

#[tokio::test]
async fn reserve_then_release_round_trips() {
    let mediator = FakeMediator::new();
    let job_id = JobId::new();

    let lease = mediator.reserve_access(&job_id).await.unwrap();
    assert!(mediator.is_locked());

    mediator.remove_lock(&lease).await.unwrap();
    assert!(!mediator.is_locked());
}

#[tokio::test]
async fn second_reservation_is_denied_while_lock_is_held() {
    let mediator = FakeMediator::new();
    let job_id = JobId::new();
    let _lease = mediator.reserve_access(&job_id).await.unwrap();

    let err = mediator.reserve_access(&job_id).await.unwrap_err();
    assert!(matches!(err, MediatorError::Denied { .. }));
}

#[tokio::test]
async fn create_and_update_action_after_lease_release() {
    let mediator = FakeMediator::new();
    let job_id = JobId::new();
    let lease = mediator.reserve_access(&job_id).await.unwrap();
    mediator.remove_lock(&lease).await.unwrap();

    let action_id = mediator.create_action(CreateActionRequest { state: 42 }).await.unwrap();
    mediator.update_action(&action_id, UpdateActionRequest::completed(None)).await.unwrap();

    let actions = mediator.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].updates.len(), 1);
    assert_eq!(actions[0].updates[0].outcome, ActionOutcome::Completed);
}

#[tokio::test]
async fn update_action_rejects_unknown_action_id() {
    let mediator = FakeMediator::new();
    let unknown = osmdbt_core::ActionId::new();
    let err = mediator.update_action(&unknown, UpdateActionRequest::completed(None)).await.unwrap_err();
    assert!(matches!(err, MediatorError::Request(_)));
}
