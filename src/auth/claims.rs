// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use crate::ids::UserId;

/// Claims carried inside every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user's handle
    pub sub: String,

    /// Issued at timestamp (seconds)
    pub iat: i64,

    /// Expiration timestamp (seconds)
    pub exp: i64,
}

/// Authenticated user resolved from a verified token.
///
/// This is the primary type used throughout the application to represent
/// the caller. Handlers receive it from the `Auth` extractor and hand it to
/// every service call that acts on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    /// Durable user id
    pub user_id: UserId,

    /// Handle the token was issued for
    pub handle: String,

    /// User's role
    pub role: Role,
}
