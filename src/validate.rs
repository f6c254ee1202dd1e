// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request data validation.
//!
//! The [`Validator`] is constructed once at startup and shared through
//! `AppState`. Request payloads derive [`garde::Validate`]; failures come back
//! as [`FieldErrors`], which the error middleware renders as a 400 response
//! with one entry per offending field.

use std::fmt;

pub use garde::Validate;
use garde::Report;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A validation failure for one request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the JSON payload.
    pub field: String,
    /// Human readable message.
    pub error: String,
}

/// A collection of field failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            error: error.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FieldErrors {}

/// Errors for single-value checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("ID is not in its proper form")]
    InvalidId,
}

/// Validation service.
///
/// Payloads declare their rules with `#[derive(garde::Validate)]`; the
/// validator runs them and reports the first failure of each field.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    _private: (),
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the payload's rules and collect one failure per field.
    pub fn check<T>(&self, value: &T) -> Result<(), FieldErrors>
    where
        T: Validate + ?Sized,
        T::Context: Default,
    {
        match value.validate() {
            Ok(()) => Ok(()),
            Err(report) => Err(Self::field_errors(&report)),
        }
    }

    /// Validate that `id` is a UUID.
    pub fn check_id(&self, id: &str) -> Result<Uuid, ValidateError> {
        Uuid::parse_str(id).map_err(|_| ValidateError::InvalidId)
    }

    fn field_errors(report: &Report) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for (path, error) in report.iter() {
            let field = path.to_string();
            if errors.iter().any(|f| f.field == field) {
                continue;
            }
            errors.push(field, error.message());
        }
        errors
    }
}
