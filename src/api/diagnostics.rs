// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::error::Error;
use crate::web::{self, Handler, RequestContext};

#[derive(Debug, Serialize)]
struct Status {
    status: &'static str,
}

/// Answers `{"status":"OK"}`. Mounted both publicly and behind auth.
pub struct Test;

#[async_trait]
impl Handler for Test {
    async fn handle(&self, ctx: &mut RequestContext, _req: Request) -> Result<Response, Error> {
        web::respond(ctx, StatusCode::OK, &Status { status: "OK" })
    }
}
