// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness HTTP server: `GET /healthz` and `GET /metrics`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Flips to `true` once the first job has completed its reserve phase,
/// per the liveness contract: `/healthz` reports healthy only after the
/// engine has proven it can talk to the mediator at least once.
#[derive(Debug, Default)]
pub struct Liveness(AtomicBool);

impl Liveness {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(false)))
    }

    pub fn mark_ready(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct AppState {
    liveness: Arc<Liveness>,
    registry: Registry,
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    if state.liveness.is_ready() {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let families = state.registry.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&families, &mut buffer) {
        error!(%error, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    (StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned())
}

fn router(liveness: Arc<Liveness>, registry: Registry) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(AppState { liveness, registry })
}

/// Serve the liveness endpoint until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    liveness: Arc<Liveness>,
    registry: Registry,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(liveness, registry);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "liveness server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
