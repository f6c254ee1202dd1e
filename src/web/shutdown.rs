// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide shutdown signalling.
//!
//! Request handling holds a clonable [`ShutdownSignal`]; the supervisor in
//! `main.rs` owns the single [`ShutdownListener`] and begins a graceful
//! drain when a request arrives on it.

use thiserror::Error;
use tokio::sync::mpsc;

/// Integrity failure that must take the process down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ShutdownError {
    message: String,
}

impl ShutdownError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One request to shut down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownRequest {
    pub reason: String,
}

/// Create a connected signal/listener pair.
pub fn channel() -> (ShutdownSignal, ShutdownListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ShutdownSignal { tx }, ShutdownListener { rx })
}

/// Sending half, shared by every request.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: mpsc::UnboundedSender<ShutdownRequest>,
}

impl ShutdownSignal {
    /// Deliver one shutdown request. Never blocks.
    ///
    /// Returns `false` if the listener is gone.
    pub fn signal(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        tracing::warn!(reason = %reason, "Shutdown requested");
        self.tx.send(ShutdownRequest { reason }).is_ok()
    }
}

/// Receiving half, owned by the supervisor.
#[derive(Debug)]
pub struct ShutdownListener {
    rx: mpsc::UnboundedReceiver<ShutdownRequest>,
}

impl ShutdownListener {
    /// Wait for the next request. `None` once every signal is dropped.
    pub async fn recv(&mut self) -> Option<ShutdownRequest> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ShutdownRequest> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_signal_is_delivered_once() {
        let (signal, mut listener) = channel();
        let clone = signal.clone();

        assert!(signal.signal("first"));
        assert!(clone.signal("second"));

        assert_eq!(listener.recv().await.unwrap().reason, "first");
        assert_eq!(listener.recv().await.unwrap().reason, "second");
        assert!(listener.try_recv().is_none());
    }

    #[tokio::test]
    async fn signal_after_listener_dropped_reports_failure() {
        let (signal, listener) = channel();
        drop(listener);
        assert!(!signal.signal("too late"));
    }

    #[tokio::test]
    async fn recv_ends_when_all_signals_dropped() {
        let (signal, mut listener) = channel();
        drop(signal);
        assert!(listener.recv().await.is_none());
    }
}
