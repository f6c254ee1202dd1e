// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared test fixtures.

use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::auth::{Authenticator, Claims};
use crate::keystore::{KeyStore, PrivateKey};

/// KID of the PKCS#1 fixture key.
pub const PKCS1_KID: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";

/// KID of the PKCS#8 fixture key.
pub const PKCS8_KID: &str = "8f2c6c1e-3a57-4d0b-9a43-1b7d2e6f9c30";

pub const PKCS1_KEY: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/testdata/keys/54bb2165-71e1-41a6-af3e-7da4a0e1e2c1.pem"
));

pub const PKCS8_KEY: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/testdata/keys/8f2c6c1e-3a57-4d0b-9a43-1b7d2e6f9c30.pem"
));

/// Key store holding the PKCS#1 fixture.
pub fn key_store() -> Arc<KeyStore> {
    let store = KeyStore::new();
    store.add(PKCS1_KID, PrivateKey::from_pem(PKCS1_KEY).expect("fixture key"));
    Arc::new(store)
}

/// Authenticator signing with the PKCS#1 fixture, plus its store.
pub fn authenticator() -> (Arc<KeyStore>, Authenticator) {
    let store = key_store();
    let auth = Authenticator::new(PKCS1_KID, store.clone()).expect("authenticator");
    (store, auth)
}

/// Claims valid for one hour.
pub fn claims(roles: &[&str]) -> Claims {
    Claims::new(
        "5cf37266-3473-4006-984f-9325122678b7",
        "authgate",
        roles.iter().copied(),
        Utc::now(),
        Duration::hours(1),
    )
}

/// Process-wide Prometheus recorder, installed once for all tests.
pub fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("install metrics recorder")
        })
        .clone()
}

/// Current value of counter `name` for route `path`, 0 if never recorded.
pub fn counter(handle: &PrometheusHandle, name: &str, path: &str) -> u64 {
    let prefix = format!("{name}{{path=\"{path}\"}} ");
    handle
        .render()
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}
