// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for mutating operations.
//!
//! Owners are compared by durable [`UserId`], never by handle, so a handle
//! released by an archived account cannot inherit that account's posts.

use crate::ids::UserId;

/// A caller tried to act on a resource somebody else owns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user {user_id} does not own {resource}")]
pub struct OwnershipViolation {
    pub user_id: UserId,
    pub resource: String,
}

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Human-readable label used in logs, e.g. `post 12`.
    fn resource_label(&self) -> String;

    /// Durable id of the owning user.
    fn owner_id(&self) -> UserId;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that `user_id` owns this resource.
    fn verify_ownership(&self, user_id: UserId) -> Result<(), OwnershipViolation>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user_id: UserId) -> Result<(), OwnershipViolation> {
        if self.owner_id() == user_id {
            Ok(())
        } else {
            Err(OwnershipViolation {
                user_id,
                resource: self.resource_label(),
            })
        }
    }
}
