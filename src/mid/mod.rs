// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Global interceptors.
//!
//! [`standard`] returns them in the order every route runs them, outermost
//! first: logging, error translation, metrics, panic recovery.

pub mod errors;
pub mod logger;
pub mod metrics;
pub mod panics;

use std::sync::Arc;

pub use errors::Errors;
pub use logger::Logger;
pub use self::metrics::RecordMetrics;
pub use panics::Panics;

use crate::web::Middleware;

/// The global interceptor stack.
pub fn standard() -> Vec<Arc<dyn Middleware>> {
    vec![
        Arc::new(Logger),
        Arc::new(Errors),
        Arc::new(RecordMetrics),
        Arc::new(Panics::new()),
    ]
}
