// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the subject handle, issue time and expiry.
//! Validity depends only on the token and the server secret; there is no
//! session table.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::claims::TokenClaims;

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Issues and verifies tokens with one server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for `handle`, expiring `ttl` from now.
    pub fn issue(&self, handle: &str) -> Result<String, TokenError> {
        self.issue_at(handle, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, handle: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: handle.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify the signature and expiry, returning the subject handle.
    pub fn verify_and_extract_subject(&self, token: &str) -> Result<String, TokenError> {
        self.verify_at(token, Utc::now()).map(|claims| claims.sub)
    }

    /// Verify against an explicit clock.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let claims = self.decode_claims(token)?;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// True if the token expired or cannot be verified at all.
    pub fn is_expired(&self, token: &str) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.verify_at(token, now).is_err()
    }

    /// Signature check only. Expiry is compared by [`Self::verify_at`] with
    /// zero leeway, so `now >= exp` is already expired.
    fn decode_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation.required_spec_claims.insert("exp".to_string());
        validation.required_spec_claims.insert("sub".to_string());

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &[u8] = b"test-secret-key-with-at-least-32-bytes!!";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::hours(1))
    }

    #[test]
    fn issued_token_round_trips_subject() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        assert_eq!(codec.verify_and_extract_subject(&token).unwrap(), "alice");
        assert!(!codec.is_expired(&token));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let issued = Utc::now() - Duration::hours(2);
        let token = codec.issue_at("alice", issued).unwrap();

        assert!(codec.is_expired(&token));
        assert_eq!(
            codec.verify_and_extract_subject(&token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue_at("alice", now).unwrap();
        let exp = now + Duration::hours(1);

        assert!(codec.verify_at(&token, exp - Duration::seconds(1)).is_ok());
        assert_eq!(codec.verify_at(&token, exp), Err(TokenError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert_eq!(
            codec.verify_and_extract_subject("not-a-token"),
            Err(TokenError::Malformed)
        );
        assert!(codec.is_expired("not-a-token"));
    }

    #[test]
    fn foreign_secret_fails_signature() {
        let other = TokenCodec::new(b"another-secret-key-with-32-bytes-or-more", Duration::hours(1));
        let token = other.issue("alice").unwrap();

        assert_eq!(
            codec().verify_and_extract_subject(&token),
            Err(TokenError::SignatureInvalid)
        );
        assert!(codec().is_expired(&token));
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = format!(
            r#"{{"sub":"mallory","iat":{},"exp":{}}}"#,
            Utc::now().timestamp(),
            (Utc::now() + Duration::hours(1)).timestamp()
        );
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(forged_claims.as_bytes()),
            parts[2]
        );

        assert_eq!(
            codec.verify_and_extract_subject(&forged),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn debug_does_not_print_keys() {
        let rendered = format!("{:?}", codec());
        assert!(!rendered.contains("secret"));
    }
}
