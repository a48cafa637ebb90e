// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings, so salt and cost parameters travel with each hash
//! and older hashes keep verifying after the defaults change.

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct CredentialError(String);

/// One-way hash and verify capability for user passwords.
#[derive(Debug, Clone)]
pub struct PasswordEncoder {
    params: Params,
}

impl Default for PasswordEncoder {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordEncoder {
    /// Encoder with explicit cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError(e.to_string()))
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| CredentialError(e.to_string()))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError(e.to_string())),
        }
    }
}
