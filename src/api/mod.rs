// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::routing::{get, MethodFilter};
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::auth::{Authenticate, Authorize, Role};
use crate::mid;
use crate::state::AppState;
use crate::web::{App, Middleware, ShutdownSignal};

pub mod diagnostics;
pub mod health;
pub mod users;

/// Build the application with every route mounted.
pub fn router(state: &AppState, shutdown: ShutdownSignal, cancel: CancellationToken) -> App {
    let mut app = App::new(shutdown, cancel, mid::standard());

    let authenticate: Arc<dyn Middleware> = Arc::new(Authenticate::new(state.auth.clone()));
    let admin: Arc<dyn Middleware> = Arc::new(Authorize::new([Role::Admin]));
    let any_user: Arc<dyn Middleware> = Arc::new(Authorize::new([Role::Admin, Role::User]));

    app.handle(MethodFilter::GET, "v1", "/test", diagnostics::Test, Vec::new());
    app.handle(
        MethodFilter::GET,
        "v1",
        "/testauth",
        diagnostics::Test,
        vec![authenticate.clone(), admin],
    );

    app.handle(
        MethodFilter::POST,
        "v1",
        "/users/token",
        users::TokenHandler {
            auth: state.auth.clone(),
            users: state.users.clone(),
            validator: state.validator.clone(),
        },
        Vec::new(),
    );
    app.handle(
        MethodFilter::GET,
        "v1",
        "/users/me",
        users::MeHandler,
        vec![authenticate, any_user],
    );

    let debug = Router::new()
        .route("/debug/liveness", get(health::liveness))
        .route("/debug/readiness", get(health::readiness))
        .route("/debug/metrics", get(health::metrics))
        .with_state(state.clone());
    app.merge(debug);

    app
}
