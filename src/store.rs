// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User credentials.
//!
//! The token route authenticates through the [`UserStore`] trait. The
//! in-memory implementation keeps PBKDF2-HMAC-SHA256 password hashes with a
//! per-user random salt and verifies them in constant time. Unknown emails
//! are verified against a fixed dummy credential so the miss path costs the
//! same PBKDF2 work as a wrong password.

use std::collections::HashMap;
use std::num::NonZeroU32;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::Claims;

const CREDENTIAL_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;

const DUMMY_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];
const DUMMY_HASH: [u8; CREDENTIAL_LEN] = [0; CREDENTIAL_LEN];

/// Default PBKDF2 work factor.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("attempted action is not allowed")]
    Forbidden,

    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    #[error("generating salt")]
    Random,

    #[error("password hashing task failed")]
    Hashing(#[source] tokio::task::JoinError),
}

/// Looks up principals and verifies their credentials.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Verify `password` for `email` and return claims issued at `now`.
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, StoreError>;
}

/// A user to register.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub password: String,
}

/// A registered user. Credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub enabled: bool,
    pub date_created: DateTime<Utc>,
}

struct Record {
    user: User,
    salt: [u8; SALT_LEN],
    iterations: NonZeroU32,
    hash: [u8; CREDENTIAL_LEN],
}

/// The material needed to check a password, copied out of the map so the
/// lock is not held while hashing.
struct Credential {
    salt: [u8; SALT_LEN],
    iterations: NonZeroU32,
    hash: [u8; CREDENTIAL_LEN],
}

impl Credential {
    fn dummy(iterations: NonZeroU32) -> Self {
        Self {
            salt: DUMMY_SALT,
            iterations,
            hash: DUMMY_HASH,
        }
    }

    fn verify(&self, password: &[u8]) -> bool {
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &self.salt,
            password,
            &self.hash,
        )
        .is_ok()
    }
}

/// Users held in process memory, keyed by lowercased email.
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, Record>>,
    issuer: String,
    ttl: Duration,
    iterations: NonZeroU32,
    rng: SystemRandom,
    #[cfg(test)]
    verifications: AtomicUsize,
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryUserStore {
    /// Tokens minted for these users carry `issuer` and live for `ttl`.
    pub fn new(issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            issuer: issuer.into(),
            ttl,
            iterations: NonZeroU32::new(DEFAULT_ITERATIONS).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
            #[cfg(test)]
            verifications: AtomicUsize::new(0),
        }
    }

    /// Override the PBKDF2 work factor for users created afterwards.
    pub fn with_iterations(mut self, iterations: NonZeroU32) -> Self {
        self.iterations = iterations;
        self
    }

    pub async fn create(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, StoreError> {
        let key = email_key(&new.email);

        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| StoreError::Random)?;

        let iterations = self.iterations;
        let password = new.password;
        let hash = tokio::task::spawn_blocking(move || {
            let mut hash = [0u8; CREDENTIAL_LEN];
            pbkdf2::derive(
                pbkdf2::PBKDF2_HMAC_SHA256,
                iterations,
                &salt,
                password.as_bytes(),
                &mut hash,
            );
            hash
        })
        .await
        .map_err(StoreError::Hashing)?;

        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: key.clone(),
            roles: new.roles,
            enabled: true,
            date_created: now,
        };

        let mut users = self.users.write().await;
        if users.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(key));
        }
        users.insert(
            key,
            Record {
                user: user.clone(),
                salt,
                iterations: self.iterations,
                hash,
            },
        );
        Ok(user)
    }

    pub async fn query_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(&email_key(email))
            .map(|r| r.user.clone())
            .ok_or(StoreError::NotFound)
    }

    /// Disabled users can no longer obtain tokens.
    pub async fn set_enabled(&self, email: &str, enabled: bool) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let record = users
            .get_mut(&email_key(email))
            .ok_or(StoreError::NotFound)?;
        record.user.enabled = enabled;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, StoreError> {
        let found = {
            let users = self.users.read().await;
            users.get(&email_key(email)).map(|record| {
                let credential = Credential {
                    salt: record.salt,
                    iterations: record.iterations,
                    hash: record.hash,
                };
                (record.user.clone(), credential)
            })
        };

        let (user, credential) = match found {
            Some((user, credential)) => (Some(user), credential),
            None => (None, Credential::dummy(self.iterations)),
        };

        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);

        let password = password.as_bytes().to_vec();
        let verified = tokio::task::spawn_blocking(move || credential.verify(&password))
            .await
            .map_err(StoreError::Hashing)?;

        let user = user.ok_or(StoreError::NotFound)?;
        if !verified {
            return Err(StoreError::AuthenticationFailed);
        }
        if !user.enabled {
            return Err(StoreError::Forbidden);
        }

        Ok(Claims::new(
            user.id.to_string(),
            self.issuer.clone(),
            user.roles,
            now,
            self.ttl,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryUserStore {
        InMemoryUserStore::new("authgate", Duration::hours(1))
            .with_iterations(NonZeroU32::new(1_000).unwrap())
    }

    fn admin() -> NewUser {
        NewUser {
            name: "Admin Gopher".to_string(),
            email: "admin@example.com".to_string(),
            roles: vec!["ADMIN".to_string(), "USER".to_string()],
            password: "gophers".to_string(),
        }
    }

    #[tokio::test]
    async fn authenticate_returns_claims_for_user() {
        let store = store();
        let now = Utc::now();
        let user = store.create(admin(), now).await.unwrap();

        let claims = store
            .authenticate("admin@example.com", "gophers", now)
            .await
            .unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.iss, "authgate");
        assert_eq!(claims.roles, vec!["ADMIN".to_string(), "USER".to_string()]);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 3600);
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_whitespace() {
        let store = store();
        store.create(admin(), Utc::now()).await.unwrap();

        assert!(store
            .authenticate("  Admin@Example.com ", "gophers", Utc::now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn failures_are_distinct() {
        let store = store();
        store.create(admin(), Utc::now()).await.unwrap();

        assert!(matches!(
            store.authenticate("nobody@example.com", "gophers", Utc::now()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.authenticate("admin@example.com", "wrong", Utc::now()).await,
            Err(StoreError::AuthenticationFailed)
        ));

        store.set_enabled("admin@example.com", false).await.unwrap();
        assert!(matches!(
            store.authenticate("admin@example.com", "gophers", Utc::now()).await,
            Err(StoreError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn unknown_email_still_hashes() {
        let store = store();
        store.create(admin(), Utc::now()).await.unwrap();
        assert_eq!(store.verifications.load(Ordering::SeqCst), 0);

        assert!(matches!(
            store.authenticate("nobody@example.com", "gophers", Utc::now()).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.verifications.load(Ordering::SeqCst), 1);

        assert!(matches!(
            store.authenticate("admin@example.com", "wrong", Utc::now()).await,
            Err(StoreError::AuthenticationFailed)
        ));
        assert_eq!(store.verifications.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dummy_credential_rejects_every_password() {
        let dummy = Credential::dummy(NonZeroU32::new(1_000).unwrap());
        assert!(!dummy.verify(b""));
        assert!(!dummy.verify(b"gophers"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = store();
        store.create(admin(), Utc::now()).await.unwrap();

        let mut again = admin();
        again.email = "ADMIN@example.com".to_string();
        assert!(matches!(
            store.create(again, Utc::now()).await,
            Err(StoreError::DuplicateEmail(_))
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn salts_differ_per_user() {
        let store = store();
        store.create(admin(), Utc::now()).await.unwrap();
        let mut other = admin();
        other.email = "other@example.com".to_string();
        store.create(other, Utc::now()).await.unwrap();

        let users = store.users.read().await;
        let a = &users["admin@example.com"];
        let b = &users["other@example.com"];
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }
}
