// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Comment repository. Comments list in insertion order and are never
//! archived.

use chrono::{DateTime, Utc};
use redb::WriteTransaction;
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, PostId, UserId};
use crate::pagination::{Page, PageRequest};
use crate::storage::database::{
    get_indexed, index_insert, index_page, next_id, pair_key, put_record, Snapshot, StoreResult,
    COMMENTS, COMMENTS_BY_POST,
};

/// Persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredComment {
    pub id: CommentId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CommentRepository<'a, S: Snapshot> {
    txn: &'a S,
}

impl<'a, S: Snapshot> CommentRepository<'a, S> {
    pub fn new(txn: &'a S) -> Self {
        Self { txn }
    }

    pub fn list_by_post(&self, post: PostId, request: PageRequest) -> StoreResult<Page<StoredComment>> {
        let comments = self.txn.table(COMMENTS)?;
        index_page(self.txn, COMMENTS_BY_POST, post.get(), request, |id| {
            get_indexed(&comments, id)
        })
    }
}

impl CommentRepository<'_, WriteTransaction> {
    pub fn insert(&self, user: UserId, post: PostId, comment: &str) -> StoreResult<StoredComment> {
        let now = Utc::now();
        let stored = StoredComment {
            id: CommentId(next_id(self.txn, "comments")?),
            user_id: user,
            post_id: post,
            comment: comment.to_string(),
            created_at: now,
            updated_at: now,
        };

        let id = stored.id.get();
        put_record(&mut self.txn.open_table(COMMENTS)?, id, &stored)?;
        index_insert(self.txn, COMMENTS_BY_POST, post.get(), &pair_key(post.get(), id), id)?;
        Ok(stored)
    }
}
