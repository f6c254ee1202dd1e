// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::Authenticator;
use crate::keystore::KeyStore;
use crate::store::UserStore;
use crate::validate::Validator;

/// Shared dependencies handed to route handlers at registration.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
    pub keys: Arc<KeyStore>,
    pub users: Arc<dyn UserStore>,
    pub validator: Arc<Validator>,
    /// Renders the installed Prometheus recorder.
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        auth: Arc<Authenticator>,
        keys: Arc<KeyStore>,
        users: Arc<dyn UserStore>,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            auth,
            keys,
            users,
            validator: Arc::new(Validator::new()),
            metrics,
        }
    }
}
