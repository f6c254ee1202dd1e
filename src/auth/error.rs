// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::{Error, RequestError};

/// Message sent to clients for every rejected token.
///
/// Expired, forged and unknown-key tokens all look the same from outside.
pub const AUTHENTICATION_FAILED: &str = "authentication failed";

/// Message sent to clients lacking the required role.
pub const NOT_AUTHORIZED: &str = "you are not authorized for that action";

/// Authentication error type.
///
/// The variant is logged; clients only see [`AuthError::public_message`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Authorization header missing or not `Bearer <token>`
    #[error("invalid authorization header format: bearer <token>")]
    InvalidAuthHeader,

    /// Token is not a parseable JWT
    #[error("token is malformed")]
    MalformedToken,

    /// Header algorithm is outside the allow-list
    #[error("token algorithm {0} is not allowed")]
    DisallowedAlgorithm(String),

    /// Header carries no `kid`
    #[error("missing key id (kid) in token header")]
    MissingKid,

    /// `kid` does not resolve in the key store
    #[error("key not found")]
    KeyNotFound(String),

    /// Signature does not verify
    #[error("token signature is invalid")]
    InvalidSignature,

    /// `now >= exp`
    #[error("token has expired")]
    TokenExpired,

    /// Active signing key is not in the key store
    #[error("active KID {0} does not exist in store")]
    ActiveKeyMissing(String),

    /// Active private key vanished between construction and signing
    #[error("private key lookup failed")]
    PrivateKeyLookup,

    /// Encoding or signing failed
    #[error("signing token: {0}")]
    Signing(String),

    /// Valid identity without any of the required roles
    #[error("claims roles {claimed:?} do not include any of {required:?}")]
    InsufficientPermissions {
        claimed: Vec<String>,
        required: Vec<String>,
    },
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::DisallowedAlgorithm(_)
            | AuthError::MissingKid
            | AuthError::KeyNotFound(_)
            | AuthError::InvalidSignature
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions { .. } => StatusCode::FORBIDDEN,
            AuthError::ActiveKeyMissing(_)
            | AuthError::PrivateKeyLookup
            | AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidAuthHeader => {
                "invalid authorization header format: bearer <token>"
            }
            AuthError::InsufficientPermissions { .. } => NOT_AUTHORIZED,
            _ if self.status_code() == StatusCode::UNAUTHORIZED => AUTHENTICATION_FAILED,
            _ => "Internal Server Error",
        }
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => Error::Internal(err.to_string()),
            status => Error::Request(RequestError::new(status, err.public_message()).with_cause(&err)),
        }
    }
}
