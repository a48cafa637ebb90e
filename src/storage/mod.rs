// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for users, posts, likes, comments and alarms in a single
//! embedded redb database.
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   sns.redb        # all tables, see database.rs
//! ```
//!
//! ## Important Notes
//!
//! - A service operation is one [`Store::write`] or [`Store::read`] call
//! - Nothing is hard-deleted; see [`record`]
//! - Ownership compares durable ids; see [`ownership`]

pub mod database;
pub mod ownership;
pub mod record;
pub mod repository;

pub use database::{Snapshot, Store, StoreError, StoreResult, DATABASE_FILE};
pub use ownership::{OwnedResource, OwnershipEnforcer, OwnershipViolation};
pub use record::{Lifecycle, RecordStatus, Visibility};
pub use repository::{
    AlarmRepository, CommentRepository, LikeRepository, PostRepository, StoredAlarm,
    StoredComment, StoredLike, StoredPost, StoredUser, UserRepository,
};
