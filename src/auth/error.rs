// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Each variant is a reason an identity could not be established. The
//! reasons are logged; clients only ever see the single `INVALID_TOKEN`
//! response so they cannot tell a missing token from a forged or expired one.

use axum::response::{IntoResponse, Response};

use super::token::TokenError;
use crate::error::{ApiError, ErrorCode};

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("authorization header is required")]
    MissingAuthHeader,

    /// Header present but not `Bearer <token>`
    #[error("invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,

    /// Token failed verification
    #[error("token rejected: {0}")]
    Token(#[from] TokenError),

    /// Token verified but no active user holds the subject handle
    #[error("no active user for token subject")]
    UnknownSubject,

    /// The user lookup itself failed
    #[error("identity lookup failed: {0}")]
    Lookup(String),

    /// Guarded route reached without an identity
    #[error("authentication required")]
    Unauthenticated,
}

impl AuthError {
    /// Machine-readable reason, used in logs only.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::Token(TokenError::Expired) => "token_expired",
            AuthError::Token(TokenError::Malformed) => "malformed_token",
            AuthError::Token(TokenError::SignatureInvalid) => "invalid_signature",
            AuthError::Token(TokenError::Encoding(_)) => "token_encoding",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::Lookup(_) => "lookup_failed",
            AuthError::Unauthenticated => "unauthenticated",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = self.reason(), "Rejecting unauthenticated request");
        ApiError::new(ErrorCode::InvalidToken, self.to_string()).into_response()
    }
}
