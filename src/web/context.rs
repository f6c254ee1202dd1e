// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request state threaded through the interceptor chain.

use std::time::Instant;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::auth::Claims;
use crate::error::Error;

/// Trace id reported when a request has no values.
pub const ZERO_TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

const VALUES_MISSING: &str = "web value missing from context";

/// Values installed by the entry adapter before any interceptor runs.
#[derive(Debug, Clone)]
pub struct RequestValues {
    pub trace_id: String,
    /// Wall clock time the request arrived.
    pub now: DateTime<Utc>,
    /// Monotonic start, for latency.
    pub started: Instant,
    /// Status written to the client, once known.
    pub status_code: Option<StatusCode>,
}

/// Request scope passed by `&mut` to every interceptor and the handler.
#[derive(Debug)]
pub struct RequestContext {
    values: Option<RequestValues>,
    claims: Option<Claims>,
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new(trace_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            values: Some(RequestValues {
                trace_id: trace_id.into(),
                now: Utc::now(),
                started: Instant::now(),
                status_code: None,
            }),
            claims: None,
            cancel,
        }
    }

    /// A context that never went through the entry adapter.
    ///
    /// Interceptors treat it as an integrity failure.
    pub fn detached() -> Self {
        Self {
            values: None,
            claims: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Request values, or a shutdown-class error when they are missing.
    pub fn values(&self) -> Result<&RequestValues, Error> {
        self.values.as_ref().ok_or_else(|| Error::shutdown(VALUES_MISSING))
    }

    pub fn trace_id(&self) -> &str {
        self.values
            .as_ref()
            .map(|v| v.trace_id.as_str())
            .unwrap_or(ZERO_TRACE_ID)
    }

    pub fn set_status_code(&mut self, status: StatusCode) -> Result<(), Error> {
        let values = self
            .values
            .as_mut()
            .ok_or_else(|| Error::shutdown(VALUES_MISSING))?;
        values.status_code = Some(status);
        Ok(())
    }

    /// Store verified claims for downstream interceptors.
    pub fn set_claims(&mut self, claims: Claims) {
        self.claims = Some(claims);
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Cancelled when the server begins shutting down.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
