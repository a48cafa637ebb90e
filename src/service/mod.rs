// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Service Layer
//!
//! Business operations on users, posts, likes, comments and alarms. Every
//! operation acting for a caller takes the caller's [`AuthenticatedUser`]
//! explicitly, re-resolves it inside its own transaction and raises a typed
//! [`ServiceError`] at the first violated precondition.

pub mod error;
pub mod posts;
pub mod users;

pub use error::{ServiceError, ServiceResult};
pub use posts::PostService;
pub use users::UserService;

use crate::auth::AuthenticatedUser;
use crate::ids::UserId;
use crate::models::UserSummary;
use crate::storage::{Snapshot, StoreError, StoredUser, UserRepository, Visibility};

/// Resolve the acting user by handle within the current transaction.
pub(crate) fn resolve_actor<S: Snapshot>(
    txn: &S,
    actor: &AuthenticatedUser,
) -> ServiceResult<StoredUser> {
    UserRepository::new(txn)
        .find_by_handle(&actor.handle, Visibility::ActiveOnly)?
        .ok_or_else(|| ServiceError::UserNotFound(actor.handle.clone()))
}

/// Author summary for a post or comment. Archived authors still show.
pub(crate) fn author_summary<S: Snapshot>(txn: &S, id: UserId) -> ServiceResult<UserSummary> {
    UserRepository::new(txn)
        .get(id, Visibility::IncludeArchived)?
        .map(|user| UserSummary::from(&user))
        .ok_or_else(|| StoreError::Dangling(format!("user {id}")).into())
}
