// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! The identity is placed in the request extensions by the `authenticate`
//! middleware; the extractor never looks at the token itself.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedUser};

/// Extractor for authenticated users.
pub struct Auth(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::Unauthenticated)
    }
}
