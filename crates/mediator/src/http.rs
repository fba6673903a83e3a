// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{LeaseToken, Mediator, MediatorError};
use async_trait::async_trait;
use osmdbt_core::{ActionId, CreateActionRequest, JobId, UpdateActionRequest};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct MediatorHttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl MediatorHttpClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct ReservationResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct CreateActionResponse {
    id: String,
}

#[async_trait]
impl Mediator for MediatorHttpClient {
    async fn reserve_access(&self, job_id: &JobId) -> Result<LeaseToken, MediatorError> {
        let response = self
            .client
            .post(self.url("/locks"))
            .json(&serde_json::json!({ "jobId": job_id.as_str() }))
            .send()
            .await
            .map_err(|e| MediatorError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(MediatorError::Denied { reason: "lock already held".into() });
        }
        if !response.status().is_success() {
            return Err(MediatorError::BadStatus(response.status().as_u16()));
        }

        let body: ReservationResponse =
            response.json().await.map_err(|e| MediatorError::Request(e.to_string()))?;
        Ok(LeaseToken(body.token))
    }

    async fn create_action(&self, request: CreateActionRequest) -> Result<ActionId, MediatorError> {
        let response = self
            .client
            .post(self.url("/actions"))
            .json(&request)
            .send()
            .await
            .map_err(|e| MediatorError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediatorError::BadStatus(response.status().as_u16()));
        }
        let body: CreateActionResponse =
            response.json().await.map_err(|e| MediatorError::Request(e.to_string()))?;
        Ok(ActionId::from_string(body.id))
    }

    async fn update_action(
        &self,
        action_id: &ActionId,
        request: UpdateActionRequest,
    ) -> Result<(), MediatorError> {
        let response = self
            .client
            .patch(self.url(&format!("/actions/{}", action_id.as_str())))
            .json(&request)
            .send()
            .await
            .map_err(|e| MediatorError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediatorError::BadStatus(response.status().as_u16()));
        }
        Ok(())
    }

    async fn remove_lock(&self, lease: &LeaseToken) -> Result<(), MediatorError> {
        let response = self
            .client
            .delete(self.url(&format!("/locks/{}", lease.0)))
            .send()
            .await
            .map_err(|e| MediatorError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediatorError::BadStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
