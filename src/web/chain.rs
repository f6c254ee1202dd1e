// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ordered interceptor composition.
//!
//! A [`Chain`] is built once per route: global interceptors first, then the
//! route's own, then the handler. Running it walks the slice front to back,
//! so the first interceptor is the outermost.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

use super::context::RequestContext;
use crate::error::Error;

/// Terminal request processor.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, ctx: &mut RequestContext, req: Request) -> Result<Response, Error>;
}

/// Wraps the rest of the chain.
///
/// Call `next.run(ctx, req)` to continue, or return without calling it to
/// short-circuit.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn intercept(
        &self,
        ctx: &mut RequestContext,
        req: Request,
        next: Next<'_>,
    ) -> Result<Response, Error>;
}

/// The remainder of a chain, from some interceptor inward.
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub async fn run(self, ctx: &mut RequestContext, req: Request) -> Result<Response, Error> {
        match self.middleware.split_first() {
            Some((first, rest)) => {
                let next = Next {
                    middleware: rest,
                    handler: self.handler,
                };
                first.intercept(ctx, req, next).await
            }
            None => self.handler.handle(ctx, req).await,
        }
    }
}

/// A handler wrapped in its interceptors.
#[derive(Clone)]
pub struct Chain {
    middleware: Arc<[Arc<dyn Middleware>]>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    pub fn new(
        global: &[Arc<dyn Middleware>],
        route: Vec<Arc<dyn Middleware>>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let middleware: Vec<_> = global.iter().cloned().chain(route).collect();
        Self {
            middleware: middleware.into(),
            handler,
        }
    }

    /// Number of interceptors around the handler.
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    pub async fn run(&self, ctx: &mut RequestContext, req: Request) -> Result<Response, Error> {
        Next {
            middleware: &self.middleware,
            handler: self.handler.as_ref(),
        }
        .run(ctx, req)
        .await
    }
}
