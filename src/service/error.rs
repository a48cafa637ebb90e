// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Business-rule failures raised by the services.

use crate::auth::{CredentialError, TokenError};
use crate::error::ErrorCode;
use crate::storage::{OwnershipViolation, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("post {0} not found")]
    PostNotFound(u64),

    #[error("handle {0} is already taken")]
    DuplicateHandle(String),

    #[error("password does not match")]
    InvalidPassword,

    #[error("permission denied: {0}")]
    PermissionDenied(#[from] OwnershipViolation),

    #[error("user {user} already liked post {post}")]
    AlreadyLiked { user: String, post: u64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::UserNotFound(_) => ErrorCode::UserNotFound,
            ServiceError::PostNotFound(_) => ErrorCode::PostNotFound,
            ServiceError::DuplicateHandle(_) => ErrorCode::DuplicatedUserName,
            ServiceError::InvalidPassword => ErrorCode::InvalidPassword,
            ServiceError::PermissionDenied(_) => ErrorCode::InvalidPermission,
            ServiceError::AlreadyLiked { .. } => ErrorCode::AlreadyLiked,
            ServiceError::Store(_) => ErrorCode::DatabaseError,
            ServiceError::Credential(_) | ServiceError::Token(_) => ErrorCode::InternalServerError,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::UserId;

    #[test]
    fn every_variant_has_a_code() {
        assert_eq!(
            ServiceError::DuplicateHandle("a".into()).code(),
            ErrorCode::DuplicatedUserName
        );
        assert_eq!(ServiceError::InvalidPassword.code(), ErrorCode::InvalidPassword);
        assert_eq!(
            ServiceError::PermissionDenied(OwnershipViolation {
                user_id: UserId(1),
                resource: "post 1".into(),
            })
            .code(),
            ErrorCode::InvalidPermission
        );
        assert_eq!(
            ServiceError::Store(StoreError::Dangling("x".into())).code(),
            ErrorCode::DatabaseError
        );
    }
}
