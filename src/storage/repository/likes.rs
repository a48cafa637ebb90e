// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Like repository.
//!
//! `likes_by_user_post` holds at most one entry per (user, post). The service
//! checks it with [`LikeRepository::find`] and inserts inside the same write
//! transaction, so two concurrent likes for one pair cannot both succeed.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use crate::ids::{LikeId, PostId, UserId};
use crate::storage::database::{
    get_record, index_count, index_insert, next_id, pair_key, put_record, Snapshot, StoreError,
    StoreResult, LIKES, LIKES_BY_POST, LIKES_BY_USER_POST,
};

/// Persisted like. Likes are never archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLike {
    pub id: LikeId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

pub struct LikeRepository<'a, S: Snapshot> {
    txn: &'a S,
}

impl<'a, S: Snapshot> LikeRepository<'a, S> {
    pub fn new(txn: &'a S) -> Self {
        Self { txn }
    }

    /// The like `user` left on `post`, if any.
    pub fn find(&self, user: UserId, post: PostId) -> StoreResult<Option<StoredLike>> {
        let key = pair_key(user.get(), post.get());
        let id = match self.txn.table(LIKES_BY_USER_POST)?.get(key.as_slice())? {
            Some(id) => id.value(),
            None => return Ok(None),
        };
        get_record::<StoredLike>(&self.txn.table(LIKES)?, id)?
            .map(Some)
            .ok_or_else(|| StoreError::Dangling(format!("like {id}")))
    }

    pub fn count_by_post(&self, post: PostId) -> StoreResult<u64> {
        index_count(self.txn, LIKES_BY_POST, post.get())
    }
}

impl LikeRepository<'_, WriteTransaction> {
    pub fn insert(&self, user: UserId, post: PostId) -> StoreResult<StoredLike> {
        let like = StoredLike {
            id: LikeId(next_id(self.txn, "likes")?),
            user_id: user,
            post_id: post,
            created_at: Utc::now(),
        };

        let id = like.id.get();
        put_record(&mut self.txn.open_table(LIKES)?, id, &like)?;
        self.txn
            .open_table(LIKES_BY_USER_POST)?
            .insert(pair_key(user.get(), post.get()).as_slice(), id)?;
        index_insert(self.txn, LIKES_BY_POST, post.get(), &pair_key(post.get(), id), id)?;
        Ok(like)
    }
}
