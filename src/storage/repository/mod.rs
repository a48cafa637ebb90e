// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository borrows a transaction. Queries are written once against
//! [`Snapshot`](super::Snapshot) and work inside both read and write
//! transactions; mutations are only available on a write transaction.

pub mod alarms;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;

pub use alarms::{AlarmRepository, StoredAlarm};
pub use comments::{CommentRepository, StoredComment};
pub use likes::{LikeRepository, StoredLike};
pub use posts::{PostRepository, StoredPost};
pub use users::{StoredUser, UserRepository};
