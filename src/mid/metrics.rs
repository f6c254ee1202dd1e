// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request counters.
//!
//! Counters go through the `metrics` facade. The process installs a
//! Prometheus recorder at startup and `/debug/metrics` renders it.

use async_trait::async_trait;
use axum::extract::{MatchedPath, Request};
use axum::response::Response;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::error::Error;
use crate::web::{Middleware, Next, RequestContext};

pub const REQUESTS_TOTAL: &str = "authgate_requests_total";
pub const ERRORS_TOTAL: &str = "authgate_errors_total";
pub const PANICS_TOTAL: &str = "authgate_panics_total";

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Counts requests, errors and recovered panics per route.
pub struct RecordMetrics;

#[async_trait]
impl Middleware for RecordMetrics {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        // Route template, so path parameters never become labels.
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| req.uri().path().to_owned());

        let result = next.run(ctx, req).await;

        ::metrics::counter!(REQUESTS_TOTAL, "path" => path.clone()).increment(1);
        if let Err(err) = &result {
            ::metrics::counter!(ERRORS_TOTAL, "path" => path.clone()).increment(1);
            if matches!(err, Error::Panic { .. }) {
                ::metrics::counter!(PANICS_TOTAL, "path" => path).increment(1);
            }
        }

        result
    }
}
