// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Debug health checks. Mounted outside the interceptor chain.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Readiness response with individual component status.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual readiness checks.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Whether the active signing key still resolves.
    pub signing_key: String,
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: String,
    pub build: String,
    pub host: String,
}

/// Always 200 while the process is running.
pub async fn liveness() -> Json<LivenessResponse> {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string());
    Json(LivenessResponse {
        status: "up".to_string(),
        build: env!("CARGO_PKG_VERSION").to_string(),
        host,
    })
}

/// 200 if tokens can be minted, 503 otherwise.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let key_ok = state.auth.is_ready();

    let response = ReadyResponse {
        status: if key_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            signing_key: if key_ok { "ok" } else { "missing" }.to_string(),
        },
    };

    let status = if key_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Prometheus text exposition of the request counters.
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
