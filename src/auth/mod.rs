// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! RSA-signed identity tokens and role checks for the API.
//!
//! ## Auth Flow
//!
//! 1. Client exchanges credentials at `POST /v1/users/token`
//! 2. The [`Authenticator`] signs [`Claims`] with the active KID
//! 3. Client sends `Authorization: Bearer <token>`
//! 4. The [`Authenticate`] interceptor verifies the token and stores the
//!    claims in the request context
//! 5. The [`Authorize`] interceptor checks the claims against the route's
//!    required roles
//!
//! ## Security
//!
//! - Only RS256 is accepted
//! - Expired, forged and unknown-key tokens produce the same 401 body
//! - Removing a KID from the key store revokes every token signed with it

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod middleware;
pub mod roles;

pub use authenticator::Authenticator;
pub use claims::Claims;
pub use error::AuthError;
pub use middleware::{Authenticate, Authorize};
pub use roles::Role;
