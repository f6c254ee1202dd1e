// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Small web framework on top of axum.
//!
//! Routes are registered as a [`Handler`] plus per-route [`Middleware`]. Each
//! route is mounted on the axum router behind an entry adapter that installs
//! the [`RequestContext`] and runs the route's [`Chain`]. An error that
//! escapes every interceptor is treated as an integrity failure: the adapter
//! signals shutdown and answers with a generic 500.

pub mod chain;
pub mod context;
pub mod shutdown;

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower::util::MapRequestLayer;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info_span, Instrument};

pub use chain::{Chain, Handler, Middleware, Next};
pub use context::{RequestContext, RequestValues};
pub use shutdown::{ShutdownError, ShutdownListener, ShutdownRequest, ShutdownSignal};

use crate::error::{Error, ErrorResponse, RequestError};

/// Header carrying the per-request trace id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client supplied request id adopted as the trace id.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Upper bound on request bodies read by [`decode`].
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Application router with a fixed set of global interceptors.
pub struct App {
    router: Router,
    global: Vec<Arc<dyn Middleware>>,
    shutdown: ShutdownSignal,
    cancel: CancellationToken,
}

impl App {
    /// `global` runs around every route, first element outermost.
    ///
    /// `cancel` is the server's token; each request gets a child of it.
    pub fn new(
        shutdown: ShutdownSignal,
        cancel: CancellationToken,
        global: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Self {
            router: Router::new(),
            global,
            shutdown,
            cancel,
        }
    }

    /// Mount `handler` at `/{group}{path}` (or `path` when `group` is empty).
    ///
    /// Route middleware runs inside the globals, first element outermost.
    pub fn handle(
        &mut self,
        method: MethodFilter,
        group: &str,
        path: &str,
        handler: impl Handler,
        middleware: Vec<Arc<dyn Middleware>>,
    ) {
        let route = if group.is_empty() {
            path.to_string()
        } else {
            format!("/{group}{path}")
        };

        let entry = Arc::new(Entry {
            chain: Chain::new(&self.global, middleware, Arc::new(handler)),
            shutdown: self.shutdown.clone(),
            cancel: self.cancel.clone(),
        });

        let method_router = on(method, move |req: Request| {
            let entry = Arc::clone(&entry);
            async move { entry.dispatch(req).await }
        });

        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.route(&route, method_router);
    }

    /// Mount plain axum routes that bypass the interceptor chain.
    pub fn merge(&mut self, other: Router) {
        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.merge(other);
    }

    /// The shutdown signal shared with every route.
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Finished router with request-id and CORS layers applied.
    pub fn router(&self) -> Router {
        self.router
            .clone()
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(MapRequestLayer::new(drop_invalid_request_id))
            .layer(CorsLayer::permissive())
    }

    pub fn into_router(self) -> Router {
        self.router()
    }

    /// Dispatch one request in-process.
    pub async fn serve(&self, req: Request) -> Response {
        match self.router().oneshot(req).await {
            Ok(resp) => resp,
            Err(never) => match never {},
        }
    }
}

/// Request ids are 1..=128 characters of `[A-Za-z0-9._-]`.
fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Strip a malformed `x-request-id` so a fresh one is generated.
fn drop_invalid_request_id(mut req: Request) -> Request {
    let invalid = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .is_some_and(|v| !v.to_str().is_ok_and(is_valid_request_id));
    if invalid {
        req.headers_mut().remove(REQUEST_ID_HEADER);
    }
    req
}

/// Entry adapter for one route.
struct Entry {
    chain: Chain,
    shutdown: ShutdownSignal,
    cancel: CancellationToken,
}

impl Entry {
    async fn dispatch(&self, req: Request) -> Response {
        let trace_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|id| is_valid_request_id(id))
            .map(str::to_owned)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut ctx = RequestContext::new(trace_id.clone(), self.cancel.child_token());
        let span = info_span!("request", trace_id = %trace_id);

        match self.chain.run(&mut ctx, req).instrument(span).await {
            Ok(resp) => resp,
            Err(err) => {
                error!(trace_id = %trace_id, error = %err, "Unhandled error escaped the chain");
                self.shutdown.signal(err.to_string());
                let (status, body) = ErrorResponse::internal();
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Record `status` on the context and write `data` as JSON.
///
/// `204 No Content` writes no body.
pub fn respond<T: Serialize>(
    ctx: &mut RequestContext,
    status: StatusCode,
    data: &T,
) -> Result<Response, Error> {
    ctx.set_status_code(status)?;
    if status == StatusCode::NO_CONTENT {
        return Ok(status.into_response());
    }
    Ok((status, Json(data)).into_response())
}

/// Read and deserialize a JSON request body.
pub async fn decode<T: DeserializeOwned>(req: Request) -> Result<T, Error> {
    let bytes = to_bytes(req.into_body(), MAX_BODY_SIZE)
        .await
        .map_err(|e| RequestError::bad_request("unable to read request body").with_cause(e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| RequestError::bad_request("unable to decode payload").with_cause(e).into())
}
