// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use authgate_server::api::router;
use authgate_server::auth::{Authenticator, Role};
use authgate_server::config::{Config, LogFormat, DEFAULT_LOG_FILTER};
use authgate_server::keystore::KeyStore;
use authgate_server::mid::metrics::install_recorder;
use authgate_server::state::AppState;
use authgate_server::store::{InMemoryUserStore, NewUser};
use authgate_server::web::{shutdown, ShutdownListener};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().with_current_span(true).init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        keys_dir = %config.keys_dir.display(),
        active_kid = %config.active_kid,
        "Starting service"
    );

    let keys = Arc::new(
        KeyStore::from_dir(&config.keys_dir)
            .with_context(|| format!("loading keys from {}", config.keys_dir.display()))?,
    );
    info!(kids = ?keys.kids(), "Key store loaded");

    let auth = Authenticator::new(config.active_kid.clone(), keys.clone())
        .context("constructing authenticator")?;

    let ttl = chrono::Duration::from_std(config.token_ttl).context("token ttl out of range")?;
    let users = InMemoryUserStore::new(config.token_issuer.clone(), ttl);
    if let Some(seed) = &config.seed_admin {
        users
            .create(
                NewUser {
                    name: "Administrator".to_string(),
                    email: seed.email.clone(),
                    roles: vec![Role::Admin.into(), Role::User.into()],
                    password: seed.password.clone(),
                },
                Utc::now(),
            )
            .await
            .context("seeding admin user")?;
        info!(email = %seed.email, "Seeded admin user");
    }

    let metrics = install_recorder().context("installing metrics recorder")?;
    let state = AppState::new(Arc::new(auth), keys, Arc::new(users), metrics);
    let (signal, listener) = shutdown::channel();
    let cancel = CancellationToken::new();
    let app = router(&state, signal, cancel.clone()).into_router();

    let addr = config.bind_addr()?;
    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    let server_cancel = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(
            tcp,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { server_cancel.cancelled().await })
        .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("server task failed")?.context("server error")?;
            return Ok(());
        }
        reason = wait_for_shutdown(listener) => {
            info!(%reason, "Shutdown started");
        }
    }

    cancel.cancel();
    match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
        Ok(Ok(Ok(()))) => info!("Shutdown complete"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Server task failed during shutdown"),
        Err(_) => {
            warn!(
                timeout_secs = config.shutdown_timeout.as_secs(),
                "Graceful shutdown timed out, aborting"
            );
            server.abort();
            anyhow::bail!("could not stop server gracefully");
        }
    }

    Ok(())
}

/// Resolves with the reason the process should stop.
async fn wait_for_shutdown(mut listener: ShutdownListener) -> String {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let integrity = async {
        match listener.recv().await {
            Some(request) => request.reason,
            None => std::future::pending::<String>().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => "interrupt".to_string(),
        _ = terminate => "terminate".to_string(),
        reason = integrity => format!("integrity failure: {reason}"),
    }
}
