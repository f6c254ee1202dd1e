// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identity carried by a signed token.
///
/// `iat` and `exp` are Unix timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (principal ID)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Granted roles
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Claims issued at `issued_at` and valid for `ttl`.
    pub fn new<I, S>(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        roles: I,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// True if the claims hold at least one of `required`.
    pub fn authorize<R: AsRef<str>>(&self, required: &[R]) -> bool {
        self.roles
            .iter()
            .any(|has| required.iter().any(|want| has == want.as_ref()))
    }
}
