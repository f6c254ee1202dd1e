// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token minting and verification.
//!
//! ## Security
//!
//! - Tokens are signed with RS256 under the single active KID
//! - The header algorithm is checked against a fixed allow-list before any
//!   key is resolved, so `none`, HMAC and other RSA variants never reach
//!   signature verification
//! - Verification resolves the *public* key named by the token's `kid`, so
//!   tokens issued under a rotated-out key keep working until that key is
//!   removed from the store
//! - Expiry is `now >= exp` against one clock sample per call, no leeway

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, Header, Validation};

use super::{AuthError, Claims};
use crate::keystore::KeyLookup;

/// Algorithms accepted on inbound tokens.
pub const ALLOWED_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256];

/// Mints and verifies signed identity tokens.
pub struct Authenticator {
    active_kid: String,
    keys: Arc<dyn KeyLookup>,
    algorithm: Algorithm,
    validation: Validation,
}

impl Authenticator {
    /// Create an authenticator signing with `active_kid`.
    ///
    /// Fails if the key store cannot resolve the active private key.
    pub fn new(active_kid: impl Into<String>, keys: Arc<dyn KeyLookup>) -> Result<Self, AuthError> {
        let active_kid = active_kid.into();
        if keys.private_key(&active_kid).is_err() {
            return Err(AuthError::ActiveKeyMissing(active_kid));
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        // Expiry is checked against our own clock sample in `validate_token_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            active_kid,
            keys,
            algorithm: Algorithm::RS256,
            validation,
        })
    }

    /// KID used for signing.
    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    /// Whether the active private key still resolves.
    pub fn is_ready(&self) -> bool {
        self.keys.private_key(&self.active_kid).is_ok()
    }

    /// Sign `claims` with the active key.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(self.algorithm);
        header.kid = Some(self.active_kid.clone());

        let key = self
            .keys
            .private_key(&self.active_kid)
            .map_err(|_| AuthError::PrivateKeyLookup)?;

        encode(&header, claims, key.encoding_key()).map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify `token` against the current time.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token_at(token, Utc::now().timestamp())
    }

    /// Verify `token` as of `now` (Unix seconds).
    pub fn validate_token_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::DisallowedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header.kid.ok_or(AuthError::MissingKid)?;
        let public = self
            .keys
            .public_key(&kid)
            .map_err(|_| AuthError::KeyNotFound(kid.clone()))?;

        let data = decode::<Claims>(token, public.decoding_key(), &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::DisallowedAlgorithm(format!("{:?}", header.alg)),
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::MalformedToken,
            },
        )?;

        if now >= data.claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{KeyStore, PrivateKey};
    use crate::testutil::{self, PKCS1_KEY, PKCS1_KID, PKCS8_KEY, PKCS8_KID};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::EncodingKey;

    fn forge(header: &str, claims: &Claims) -> String {
        let payload = serde_json::to_vec(claims).unwrap();
        format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn new_requires_resolvable_active_kid() {
        let store: Arc<dyn KeyLookup> = Arc::new(KeyStore::new());
        let err = Authenticator::new("missing", store).err().unwrap();
        assert!(matches!(err, AuthError::ActiveKeyMissing(kid) if kid == "missing"));
    }

    #[test]
    fn round_trip_preserves_claims() {
        let (_, auth) = testutil::authenticator();
        let claims = testutil::claims(&["ADMIN", "USER"]);

        let token = auth.generate_token(&claims).unwrap();
        assert_eq!(auth.validate_token(&token).unwrap(), claims);
    }

    #[test]
    fn header_carries_active_kid_and_rs256() {
        let (_, auth) = testutil::authenticator();
        let token = auth.generate_token(&testutil::claims(&["USER"])).unwrap();

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(PKCS1_KID));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let (_, auth) = testutil::authenticator();
        let claims = testutil::claims(&["USER"]);
        let token = auth.generate_token(&claims).unwrap();

        assert!(auth.validate_token_at(&token, claims.exp - 1).is_ok());
        assert!(matches!(
            auth.validate_token_at(&token, claims.exp),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            auth.validate_token_at(&token, claims.exp + 60),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn tokens_from_rotated_keys_remain_valid() {
        let (store, old) = testutil::authenticator();
        let claims = testutil::claims(&["USER"]);
        let old_token = old.generate_token(&claims).unwrap();

        store.add(PKCS8_KID, PrivateKey::from_pem(PKCS8_KEY).unwrap());
        let new = Authenticator::new(PKCS8_KID, store.clone()).unwrap();

        assert_eq!(new.validate_token(&old_token).unwrap(), claims);
        let new_token = new.generate_token(&claims).unwrap();
        assert_eq!(old.validate_token(&new_token).unwrap(), claims);
    }

    #[test]
    fn removing_the_kid_revokes_its_tokens() {
        let (store, auth) = testutil::authenticator();
        let token = auth.generate_token(&testutil::claims(&["USER"])).unwrap();

        assert!(store.remove(PKCS1_KID));
        let err = auth.validate_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::KeyNotFound(_)));
        assert_eq!(err.to_string(), "key not found");
        assert!(!auth.is_ready());
        assert!(matches!(
            auth.generate_token(&testutil::claims(&["USER"])),
            Err(AuthError::PrivateKeyLookup)
        ));
    }

    #[test]
    fn rejects_none_algorithm() {
        let (_, auth) = testutil::authenticator();
        let token = forge(
            &format!(r#"{{"alg":"none","typ":"JWT","kid":"{PKCS1_KID}"}}"#),
            &testutil::claims(&["ADMIN"]),
        );
        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn rejects_hmac_signed_with_public_material() {
        let (_, auth) = testutil::authenticator();
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(PKCS1_KID.to_string());
        let token = encode(
            &header,
            &testutil::claims(&["ADMIN"]),
            &EncodingKey::from_secret(PKCS1_KEY),
        )
        .unwrap();

        assert!(matches!(
            auth.validate_token(&token),
            Err(AuthError::DisallowedAlgorithm(_))
        ));
    }

    #[test]
    fn rejects_other_rsa_algorithms_even_with_valid_signature() {
        let (_, auth) = testutil::authenticator();
        let mut header = Header::new(Algorithm::RS384);
        header.kid = Some(PKCS1_KID.to_string());
        let token = encode(
            &header,
            &testutil::claims(&["ADMIN"]),
            &EncodingKey::from_rsa_pem(PKCS1_KEY).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            auth.validate_token(&token),
            Err(AuthError::DisallowedAlgorithm(_))
        ));
    }

    #[test]
    fn rejects_missing_kid() {
        let (_, auth) = testutil::authenticator();
        let token = encode(
            &Header::new(Algorithm::RS256),
            &testutil::claims(&["USER"]),
            &EncodingKey::from_rsa_pem(PKCS1_KEY).unwrap(),
        )
        .unwrap();

        assert!(matches!(auth.validate_token(&token), Err(AuthError::MissingKid)));
    }

    #[test]
    fn rejects_signature_from_another_key() {
        let (store, auth) = testutil::authenticator();
        store.add(PKCS8_KID, PrivateKey::from_pem(PKCS8_KEY).unwrap());

        // Signed by the PKCS#8 key but claiming the PKCS#1 KID.
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(PKCS1_KID.to_string());
        let token = encode(
            &header,
            &testutil::claims(&["ADMIN"]),
            &EncodingKey::from_rsa_pem(PKCS8_KEY).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            auth.validate_token(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_tampered_payload() {
        let (_, auth) = testutil::authenticator();
        let token = auth.generate_token(&testutil::claims(&["USER"])).unwrap();

        let escalated =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&testutil::claims(&["ADMIN"])).unwrap());
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &escalated;
        let tampered = parts.join(".");

        assert!(matches!(
            auth.validate_token(&tampered),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_garbage() {
        let (_, auth) = testutil::authenticator();
        assert!(matches!(
            auth.validate_token("not.a.token"),
            Err(AuthError::MalformedToken)
        ));
        assert!(matches!(auth.validate_token(""), Err(AuthError::MalformedToken)));
    }

    #[test]
    fn directory_keys_sign_verify_and_revoke() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("A.pem"), PKCS1_KEY).unwrap();
        std::fs::write(dir.path().join("B.pem"), PKCS8_KEY).unwrap();

        let store = Arc::new(KeyStore::from_dir(dir.path()).unwrap());
        assert_eq!(store.kids(), vec!["A".to_string(), "B".to_string()]);

        let auth = Authenticator::new("A", Arc::clone(&store) as Arc<dyn KeyLookup>).unwrap();
        let claims = testutil::claims(&["ADMIN"]);
        let token = auth.generate_token(&claims).unwrap();
        assert_eq!(decode_header(&token).unwrap().kid.as_deref(), Some("A"));
        assert_eq!(auth.validate_token(&token).unwrap(), claims);

        assert!(store.remove("A"));
        let err = auth.validate_token(&token).err().unwrap();
        assert!(matches!(err, AuthError::KeyNotFound(ref kid) if kid == "A"));
        assert_eq!(err.to_string(), "key not found");
        assert!(!auth.is_ready());
    }
}
