// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Request};
use axum::response::Response;
use tracing::info;

use crate::error::Error;
use crate::web::{Middleware, Next, RequestContext};

/// Logs request start and completion with status and latency.
pub struct Logger;

#[async_trait]
impl Middleware for Logger {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        let started = ctx.values()?.started;

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_default();

        info!(%method, %path, %remote_addr, "Request started");

        let result = next.run(ctx, req).await;

        let status = ctx
            .values()
            .ok()
            .and_then(|v| v.status_code)
            .map(|s| s.as_u16())
            .unwrap_or_default();
        info!(
            %method,
            %path,
            %remote_addr,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );

        result
    }
}
