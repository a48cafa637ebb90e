// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the SNS API.
//!
//! ## Auth Flow
//!
//! 1. Client registers, then logs in with handle + password
//! 2. Server returns a signed token (HS256, subject = handle)
//! 3. Client sends `Authorization: Bearer <token>` on every API call
//! 4. Server:
//!    - Verifies signature and expiry
//!    - Resolves the handle to an active user
//!    - Attaches the [`AuthenticatedUser`] to the request
//! 5. The access policy rejects anonymous calls to guarded routes
//!
//! ## Security
//!
//! - Missing, malformed, forged and expired tokens produce the same response
//! - No session state is kept server-side
//! - Passwords are stored as Argon2id hashes

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::{authenticate, enforce_access, resolve_identity, IdentityResolver};
pub use password::{CredentialError, PasswordEncoder};
pub use policy::{Access, AccessPolicy, Decision, RoutePattern};
pub use roles::Role;
pub use token::{TokenCodec, TokenError};
