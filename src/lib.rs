// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authgate - Token Authentication & Middleware Core
//!
//! This crate provides RSA-signed identity tokens over a rotating key set,
//! role-based authorization, and an ordered interceptor chain around every
//! HTTP route.
//!
//! ## Modules
//!
//! - `api` - Routes and handlers
//! - `auth` - Token minting, verification and role checks
//! - `keystore` - PEM private keys indexed by KID
//! - `mid` - Global interceptors (logging, errors, metrics, panics)
//! - `web` - Interceptor chain, request context and shutdown signalling

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod keystore;
pub mod mid;
pub mod state;
pub mod store;
pub mod validate;
pub mod web;

#[cfg(test)]
mod testutil;
