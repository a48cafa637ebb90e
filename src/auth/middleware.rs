// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Two layers guard the API namespace:
//!
//! 1. [`authenticate`] tries to turn the bearer token into an
//!    [`AuthenticatedUser`] stored in the request extensions. It never
//!    rejects; any failure just leaves the request anonymous.
//! 2. [`enforce_access`] consults the [`AccessPolicy`](super::AccessPolicy)
//!    and is the only place an anonymous request is turned away.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .merge(api_routes)
//!     .layer(from_fn_with_state(state.clone(), enforce_access))
//!     .layer(from_fn_with_state(state.clone(), authenticate));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::policy::Decision;
use super::token::TokenCodec;
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Maps a verified subject handle to the full user.
pub trait IdentityResolver {
    fn resolve(&self, handle: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Extract the bearer token from the headers, verify it and resolve the
/// subject.
pub fn resolve_identity(
    headers: &HeaderMap,
    codec: &TokenCodec,
    resolver: &impl IdentityResolver,
) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)?;

    // One decode covers signature and expiry
    let handle = codec.verify_and_extract_subject(token)?;
    resolver.resolve(&handle)
}

/// Establish the caller's identity for requests inside the API namespace.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.policy.applies_to(request.uri().path()) {
        return next.run(request).await;
    }

    // Only this layer may set the identity
    request.extensions_mut().remove::<AuthenticatedUser>();

    match resolve_identity(request.headers(), state.users.tokens(), state.users.as_ref()) {
        Ok(user) => {
            debug!(user_id = %user.user_id, "Authenticated request");
            request.extensions_mut().insert(user);
        }
        Err(err) => {
            debug!(
                reason = err.reason(),
                path = %request.uri().path(),
                "Proceeding without identity"
            );
        }
    }

    next.run(request).await
}

/// Reject anonymous requests to routes that require an identity.
pub async fn enforce_access(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authenticated = request.extensions().get::<AuthenticatedUser>().is_some();
    match state.policy.evaluate(request.uri().path(), authenticated) {
        Decision::Bypass | Decision::Permit => next.run(request).await,
        Decision::Deny => AuthError::Unauthenticated.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenError};
    use crate::ids::UserId;
    use chrono::{Duration, Utc};

    struct KnownUsers(&'static [&'static str]);

    impl IdentityResolver for KnownUsers {
        fn resolve(&self, handle: &str) -> Result<AuthenticatedUser, AuthError> {
            let index = self
                .0
                .iter()
                .position(|known| *known == handle)
                .ok_or(AuthError::UnknownSubject)?;
            Ok(AuthenticatedUser {
                user_id: UserId(index as u64 + 1),
                handle: handle.to_string(),
                role: Role::User,
            })
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(b"middleware-test-secret-32-bytes-long!", Duration::hours(1))
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn valid_bearer_token_resolves_user() {
        let codec = codec();
        let token = codec.issue("bob").unwrap();
        let user = resolve_identity(
            &headers(&format!("Bearer {token}")),
            &codec,
            &KnownUsers(&["alice", "bob"]),
        )
        .unwrap();
        assert_eq!(user.handle, "bob");
        assert_eq!(user.user_id, UserId(2));
    }

    #[test]
    fn missing_header_is_reported() {
        let err = resolve_identity(&HeaderMap::new(), &codec(), &KnownUsers(&[])).unwrap_err();
        assert!(matches!(err, AuthError::MissingAuthHeader));
    }

    #[test]
    fn wrong_scheme_is_reported() {
        let codec = codec();
        let token = codec.issue("alice").unwrap();
        for value in [format!("Basic {token}"), "Bearer".to_string(), "Bearer    ".to_string()] {
            let err = resolve_identity(&headers(&value), &codec, &KnownUsers(&["alice"])).unwrap_err();
            assert!(matches!(err, AuthError::InvalidAuthHeader), "{value}");
        }
    }

    #[test]
    fn expired_token_is_reported() {
        let codec = codec();
        let token = codec
            .issue_at("alice", Utc::now() - Duration::hours(3))
            .unwrap();
        let err = resolve_identity(
            &headers(&format!("Bearer {token}")),
            &codec,
            &KnownUsers(&["alice"]),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::Token(TokenError::Expired)));
    }

    #[test]
    fn malformed_token_is_reported() {
        let err = resolve_identity(&headers("Bearer abc.def"), &codec(), &KnownUsers(&["alice"]))
            .unwrap_err();
        assert!(matches!(err, AuthError::Token(TokenError::Malformed)));
    }

    #[test]
    fn unknown_subject_is_reported() {
        let codec = codec();
        let token = codec.issue("ghost").unwrap();
        let err = resolve_identity(
            &headers(&format!("Bearer {token}")),
            &codec,
            &KnownUsers(&["alice"]),
        )
        .unwrap_err();
        assert!(matches!(err, AuthError::UnknownSubject));
    }
}
