// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request error taxonomy and its client-facing rendering.

use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::validate::{FieldErrors, ValidateError};
use crate::web::shutdown::ShutdownError;

/// Every error a handler or interceptor can return.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied data failed structural checks.
    #[error("data validation error: {0}")]
    Validation(#[from] FieldErrors),

    /// Expected failure with its own HTTP status.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Integrity failure; the process must shut down.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),

    /// Panic recovered by the panic interceptor.
    #[error("PANIC: [{message}]")]
    Panic { message: String, trace: String },

    /// Unclassified failure.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown(ShutdownError::new(message))
    }

    /// True for errors that must reach the supervisor.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown(_))
    }
}

impl From<ValidateError> for Error {
    fn from(err: ValidateError) -> Self {
        Self::Request(RequestError::bad_request(err.to_string()))
    }
}

/// An expected request failure carrying the status the client should see.
///
/// `message` is sent to the client. `cause` is only logged.
#[derive(Debug, Clone)]
pub struct RequestError {
    pub status: StatusCode,
    pub message: String,
    pub cause: Option<String>,
    pub fields: Option<FieldErrors>,
}

impl RequestError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            cause: None,
            fields: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Attach detail for the logs.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Attach per-field failures.
    pub fn with_fields(mut self, fields: FieldErrors) -> Self {
        self.fields = Some(fields);
        self
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RequestError {}

/// JSON body written for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ErrorResponse {
    /// Classify `err` into the status and body the client sees.
    ///
    /// Field failures win over a request error's own status when both are
    /// present.
    pub fn from_error(err: &Error) -> (StatusCode, Self) {
        match err {
            Error::Validation(fields) => Self::validation(fields.clone()),
            Error::Request(RequestError {
                fields: Some(fields),
                ..
            }) if !fields.is_empty() => Self::validation(fields.clone()),
            Error::Request(re) => (
                re.status,
                Self {
                    error: re.message.clone(),
                    fields: None,
                },
            ),
            Error::Shutdown(_) | Error::Panic { .. } | Error::Internal(_) => Self::internal(),
        }
    }

    /// Generic 500 body with no internal detail.
    pub fn internal() -> (StatusCode, Self) {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (
            status,
            Self {
                error: status
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_string(),
                fields: None,
            },
        )
    }

    fn validation(fields: FieldErrors) -> (StatusCode, Self) {
        (
            StatusCode::BAD_REQUEST,
            Self {
                error: "data validation error".to_string(),
                fields: Some(fields),
            },
        )
    }
}
