// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use crate::error::{Error, ErrorResponse};
use crate::web::{Middleware, Next, RequestContext};

/// Turns errors from inner layers into client responses.
///
/// Every error is logged and answered here. Shutdown-class errors are
/// answered and then returned so they reach the entry adapter.
pub struct Errors;

#[async_trait]
impl Middleware for Errors {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        ctx.values()?;

        let err = match next.run(ctx, req).await {
            Ok(resp) => return Ok(resp),
            Err(err) => err,
        };

        let (status, body) = ErrorResponse::from_error(&err);
        match &err {
            Error::Panic { message, trace } => {
                error!(error = %message, %trace, "Request panicked");
            }
            _ if status.is_server_error() => error!(error = %err, "Request failed"),
            _ => warn!(error = %err, status = status.as_u16(), "Request rejected"),
        }

        ctx.set_status_code(status)?;
        if err.is_shutdown() {
            return Err(err);
        }
        Ok((status, Json(body)).into_response())
    }
}
