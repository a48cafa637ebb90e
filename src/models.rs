// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Response types are built
//! from the stored records in `storage::repository` and never expose
//! password hashes or record status.
//!
//! ## Model Categories
//!
//! - **Users**: registration, login, public user view
//! - **Posts**: write/modify bodies, post view
//! - **Comments**: comment body, comment view
//! - **Alarms**: alarm view, developer injection body

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::alarm::{AlarmArgs, AlarmKind};
use crate::auth::Role;
use crate::ids::{AlarmId, CommentId, PostId, UserId};
use crate::storage::{StoredAlarm, StoredComment, StoredPost, StoredUser};

// =============================================================================
// User Models
// =============================================================================

/// Credentials for registration and login.
///
/// `userName` and `name` are accepted as aliases of `handle`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[serde(alias = "userName", alias = "name")]
    pub handle: String,
    pub password: String,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub handle: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredUser> for User {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id,
            handle: user.handle.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Handle and id of the user behind a post or comment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub handle: String,
}

impl From<&StoredUser> for UserSummary {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id,
            handle: user.handle.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

// =============================================================================
// Post Models
// =============================================================================

/// Body for creating or modifying a post.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PostWriteRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(post: StoredPost, owner: UserSummary) -> Self {
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            user: owner,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

// =============================================================================
// Comment Models
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub comment: String,
    pub post_id: PostId,
    pub user: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(comment: StoredComment, author: UserSummary) -> Self {
        Self {
            id: comment.id,
            comment: comment.comment,
            post_id: comment.post_id,
            user: author,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

// =============================================================================
// Alarm Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: AlarmId,
    pub alarm_type: AlarmKind,
    pub args: AlarmArgs,
    /// Display text for the alarm type
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredAlarm> for Alarm {
    fn from(alarm: StoredAlarm) -> Self {
        Self {
            id: alarm.id,
            alarm_type: alarm.kind,
            args: alarm.args,
            text: alarm.kind.text().to_string(),
            created_at: alarm.created_at,
        }
    }
}

/// Developer route body: deliver an arbitrary alarm.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DevAlarmRequest {
    pub recipient_id: UserId,
    pub kind: AlarmKind,
    pub args: AlarmArgs,
}
