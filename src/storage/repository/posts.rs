// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Post repository.
//!
//! The `posts_feed` and `posts_by_owner` indexes list active posts only;
//! archiving a post takes it out of both.

use chrono::{DateTime, Utc};
use redb::WriteTransaction;
use serde::{Deserialize, Serialize};

use crate::ids::{PostId, UserId};
use crate::pagination::{Page, PageRequest};
use crate::storage::database::{
    get_indexed, get_visible, index_insert, index_page, index_remove, newest_first_key, next_id,
    put_record, Snapshot, StoreResult, FEED_OWNER, POSTS, POSTS_BY_OWNER, POSTS_FEED,
};
use crate::storage::ownership::OwnedResource;
use crate::storage::record::{Lifecycle, RecordStatus, Visibility};

/// Persisted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub owner_id: UserId,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle for StoredPost {
    fn status(&self) -> &RecordStatus {
        &self.status
    }
}

impl OwnedResource for StoredPost {
    fn resource_label(&self) -> String {
        format!("post {}", self.id)
    }

    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

pub struct PostRepository<'a, S: Snapshot> {
    txn: &'a S,
}

impl<'a, S: Snapshot> PostRepository<'a, S> {
    pub fn new(txn: &'a S) -> Self {
        Self { txn }
    }

    pub fn get(&self, id: PostId, visibility: Visibility) -> StoreResult<Option<StoredPost>> {
        get_visible(&self.txn.table(POSTS)?, id.get(), visibility)
    }

    /// Active posts, newest first.
    pub fn list_active(&self, request: PageRequest) -> StoreResult<Page<StoredPost>> {
        let posts = self.txn.table(POSTS)?;
        index_page(self.txn, POSTS_FEED, FEED_OWNER, request, |id| {
            get_indexed(&posts, id)
        })
    }

    /// Active posts authored by `owner`, newest first.
    pub fn list_active_by_owner(
        &self,
        owner: UserId,
        request: PageRequest,
    ) -> StoreResult<Page<StoredPost>> {
        let posts = self.txn.table(POSTS)?;
        index_page(self.txn, POSTS_BY_OWNER, owner.get(), request, |id| {
            get_indexed(&posts, id)
        })
    }
}

impl PostRepository<'_, WriteTransaction> {
    pub fn insert(&self, owner: UserId, title: &str, body: &str) -> StoreResult<StoredPost> {
        let now = Utc::now();
        let post = StoredPost {
            id: PostId(next_id(self.txn, "posts")?),
            title: title.to_string(),
            body: body.to_string(),
            owner_id: owner,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let id = post.id.get();
        put_record(&mut self.txn.open_table(POSTS)?, id, &post)?;
        index_insert(self.txn, POSTS_FEED, FEED_OWNER, &newest_first_key(FEED_OWNER, id), id)?;
        index_insert(self.txn, POSTS_BY_OWNER, owner.get(), &newest_first_key(owner.get(), id), id)?;
        Ok(post)
    }

    /// Replace title and body.
    pub fn update(&self, mut post: StoredPost, title: &str, body: &str) -> StoreResult<StoredPost> {
        post.title = title.to_string();
        post.body = body.to_string();
        post.updated_at = Utc::now();
        put_record(&mut self.txn.open_table(POSTS)?, post.id.get(), &post)?;
        Ok(post)
    }

    /// Soft-delete. The row stays readable with
    /// [`Visibility::IncludeArchived`]; the listing indexes drop it.
    pub fn archive(&self, mut post: StoredPost) -> StoreResult<StoredPost> {
        let now = Utc::now();
        post.status = RecordStatus::Archived { at: now };
        post.updated_at = now;

        let id = post.id.get();
        let owner = post.owner_id.get();
        put_record(&mut self.txn.open_table(POSTS)?, id, &post)?;
        index_remove(self.txn, POSTS_FEED, FEED_OWNER, &newest_first_key(FEED_OWNER, id))?;
        index_remove(self.txn, POSTS_BY_OWNER, owner, &newest_first_key(owner, id))?;
        Ok(post)
    }
}
