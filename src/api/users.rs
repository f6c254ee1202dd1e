// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::error::{AUTHENTICATION_FAILED, NOT_AUTHORIZED};
use crate::auth::Authenticator;
use crate::error::{Error, RequestError};
use crate::store::{StoreError, UserStore};
use crate::validate::{Validate, Validator};
use crate::web::{self, Handler, RequestContext};

/// Body of POST /v1/users/token
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default)]
    #[garde(length(min = 1), email)]
    pub email: String,
    #[serde(default)]
    #[garde(length(min = 1, max = 1024))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn store_error(err: StoreError) -> Error {
    match err {
        // Unknown email and wrong password look the same to the caller.
        StoreError::NotFound | StoreError::AuthenticationFailed => {
            RequestError::unauthorized(AUTHENTICATION_FAILED)
                .with_cause(err)
                .into()
        }
        StoreError::Forbidden => RequestError::forbidden(NOT_AUTHORIZED).with_cause(err).into(),
        other => Error::internal(format!("authenticating: {other}")),
    }
}

/// Exchanges email and password for a signed token.
pub struct TokenHandler {
    pub auth: Arc<Authenticator>,
    pub users: Arc<dyn UserStore>,
    pub validator: Arc<Validator>,
}

#[async_trait]
impl Handler for TokenHandler {
    async fn handle(&self, ctx: &mut RequestContext, req: Request) -> Result<Response, Error> {
        let now = ctx.values()?.now;

        let payload: TokenRequest = web::decode(req).await?;
        self.validator.check(&payload)?;

        let claims = self
            .users
            .authenticate(&payload.email, &payload.password, now)
            .await
            .map_err(store_error)?;

        if ctx.cancellation().is_cancelled() {
            return Err(
                RequestError::new(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down").into(),
            );
        }

        let token = self.auth.generate_token(&claims)?;
        info!(subject = %claims.sub, kid = self.auth.active_kid(), "Token issued");

        web::respond(ctx, StatusCode::OK, &TokenResponse { token })
    }
}

/// Returns the caller's verified claims.
pub struct MeHandler;

#[async_trait]
impl Handler for MeHandler {
    async fn handle(&self, ctx: &mut RequestContext, _req: Request) -> Result<Response, Error> {
        let claims = ctx
            .claims()
            .cloned()
            .ok_or_else(|| RequestError::unauthorized(AUTHENTICATION_FAILED).with_cause("no claims"))?;
        web::respond(ctx, StatusCode::OK, &claims)
    }
}
