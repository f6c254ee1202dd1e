// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Panic recovery.
//!
//! A process panic hook captures the backtrace at the panic site into a
//! thread-local slot. [`Panics`] catches the unwind on the same thread and
//! turns it into [`Error::Panic`] carrying that trace.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;
use futures::FutureExt;

use crate::error::Error;
use crate::web::{Middleware, Next, RequestContext};

thread_local! {
    static LAST_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the trace-capturing panic hook. Idempotent.
///
/// The previously installed hook still runs after capture.
pub fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

fn take_trace() -> String {
    LAST_TRACE
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_else(|| "backtrace unavailable".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Converts panics beneath it into errors.
pub struct Panics;

impl Panics {
    pub fn new() -> Self {
        install_panic_hook();
        Self
    }
}

impl Default for Panics {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for Panics {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error> {
        match AssertUnwindSafe(next.run(ctx, req)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Error::Panic {
                message: panic_message(payload.as_ref()),
                trace: take_trace(),
            }),
        }
    }
}
