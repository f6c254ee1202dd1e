// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization interceptors.
//!
//! [`Authenticate`] verifies the bearer token and stores its claims on the
//! request context. [`Authorize`] must run after it and checks those claims
//! for any one of a set of roles.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use tracing::{debug, warn};

use super::{AuthError, Authenticator};
use crate::error::{Error, RequestError};
use crate::web::{Middleware, Next, RequestContext};

/// Require a valid `Authorization: Bearer <token>` header.
pub struct Authenticate {
    auth: Arc<Authenticator>,
}

impl Authenticate {
    pub fn new(auth: Arc<Authenticator>) -> Self {
        Self { auth }
    }
}

/// Extract the token from `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(value: &str) -> Result<&str, AuthError> {
    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

#[async_trait]
impl Middleware for Authenticate {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let token = bearer_token(header)?;
        let claims = self
            .auth
            .validate_token(token)
            .inspect_err(|e| debug!(error = %e, "Token rejected"))?;

        ctx.set_claims(claims);
        next.run(ctx, req).await
    }
}

/// Require at least one of `roles` in the authenticated claims.
pub struct Authorize {
    roles: Vec<String>,
}

impl Authorize {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Middleware for Authorize {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        let claims = ctx.claims().ok_or_else(|| {
            RequestError::forbidden(super::error::NOT_AUTHORIZED).with_cause("no claims")
        })?;

        if !claims.authorize(self.roles.as_slice()) {
            warn!(
                subject = %claims.sub,
                claimed = ?claims.roles,
                required = ?self.roles,
                "Authorization denied"
            );
            return Err(AuthError::InsufficientPermissions {
                claimed: claims.roles.clone(),
                required: self.roles.clone(),
            }
            .into());
        }

        next.run(ctx, req).await
    }
}
