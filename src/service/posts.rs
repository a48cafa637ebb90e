// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Posts, likes and comments.
//!
//! Like and comment each run as one write transaction: precondition checks,
//! the insert and the staged alarm commit together or not at all.

use std::sync::Arc;

use tracing::info;

use super::{author_summary, resolve_actor, ServiceError, ServiceResult};
use crate::alarm::{AlarmArgs, AlarmDispatcher, AlarmEvent, AlarmKind};
use crate::auth::AuthenticatedUser;
use crate::ids::PostId;
use crate::models::{Comment, Post};
use crate::pagination::{Page, PageRequest};
use crate::storage::{
    CommentRepository, LikeRepository, OwnershipEnforcer, PostRepository, Snapshot, Store,
    StoredPost, Visibility,
};

pub struct PostService {
    store: Arc<Store>,
    alarms: AlarmDispatcher,
}

/// Active post or `PostNotFound`.
fn active_post<S: Snapshot>(txn: &S, id: PostId) -> ServiceResult<StoredPost> {
    PostRepository::new(txn)
        .get(id, Visibility::ActiveOnly)?
        .ok_or(ServiceError::PostNotFound(id.get()))
}

fn post_view<S: Snapshot>(txn: &S, post: StoredPost) -> ServiceResult<Post> {
    let owner = author_summary(txn, post.owner_id)?;
    Ok(Post::new(post, owner))
}

impl PostService {
    pub fn new(store: Arc<Store>, alarms: AlarmDispatcher) -> Self {
        Self { store, alarms }
    }

    pub fn create(&self, actor: &AuthenticatedUser, title: &str, body: &str) -> ServiceResult<Post> {
        let post = self.store.write(|txn| {
            let user = resolve_actor(txn, actor)?;
            let post = PostRepository::new(txn).insert(user.id, title, body)?;
            post_view(txn, post)
        })?;

        info!(post_id = %post.id, user_id = %post.user.id, "Post created");
        Ok(post)
    }

    /// Replace title and body. Only the owner may modify.
    pub fn modify(
        &self,
        actor: &AuthenticatedUser,
        post_id: PostId,
        title: &str,
        body: &str,
    ) -> ServiceResult<Post> {
        self.store.write(|txn| {
            let user = resolve_actor(txn, actor)?;
            let post = active_post(txn, post_id)?;
            post.verify_ownership(user.id)?;

            let updated = PostRepository::new(txn).update(post, title, body)?;
            post_view(txn, updated)
        })
    }

    /// Soft-delete. Only the owner may delete.
    pub fn delete(&self, actor: &AuthenticatedUser, post_id: PostId) -> ServiceResult<()> {
        self.store.write(|txn| -> ServiceResult<()> {
            let user = resolve_actor(txn, actor)?;
            let post = active_post(txn, post_id)?;
            post.verify_ownership(user.id)?;

            PostRepository::new(txn).archive(post)?;
            Ok(())
        })?;

        info!(post_id = %post_id, "Post archived");
        Ok(())
    }

    /// All active posts, newest first.
    pub fn list(&self, request: PageRequest) -> ServiceResult<Page<Post>> {
        self.store.read(|txn| {
            PostRepository::new(txn)
                .list_active(request)?
                .try_map(|post| post_view(txn, post))
        })
    }

    /// The caller's active posts, newest first.
    pub fn my(&self, actor: &AuthenticatedUser, request: PageRequest) -> ServiceResult<Page<Post>> {
        self.store.read(|txn| {
            let user = resolve_actor(txn, actor)?;
            PostRepository::new(txn)
                .list_active_by_owner(user.id, request)?
                .try_map(|post| post_view(txn, post))
        })
    }

    /// Like a post once, alarming its owner.
    pub fn like(&self, actor: &AuthenticatedUser, post_id: PostId) -> ServiceResult<()> {
        let staged = self.store.write(|txn| -> ServiceResult<_> {
            let user = resolve_actor(txn, actor)?;
            let post = active_post(txn, post_id)?;

            let likes = LikeRepository::new(txn);
            if likes.find(user.id, post.id)?.is_some() {
                return Err(ServiceError::AlreadyLiked {
                    user: user.handle,
                    post: post.id.get(),
                });
            }
            likes.insert(user.id, post.id)?;

            let event = AlarmEvent::new(
                post.owner_id,
                AlarmKind::NewLikeOnPost,
                AlarmArgs::on_post(user.id, post.id),
            );
            Ok(self.alarms.stage(txn, event)?)
        })?;

        self.alarms.publish(staged);
        info!(post_id = %post_id, user_id = %actor.user_id, "Post liked");
        Ok(())
    }

    pub fn like_count(&self, post_id: PostId) -> ServiceResult<u64> {
        self.store.read(|txn| {
            let post = active_post(txn, post_id)?;
            Ok(LikeRepository::new(txn).count_by_post(post.id)?)
        })
    }

    /// Comment on a post, alarming its owner.
    pub fn comment(
        &self,
        actor: &AuthenticatedUser,
        post_id: PostId,
        comment: &str,
    ) -> ServiceResult<Comment> {
        let (comment, staged) = self.store.write(|txn| {
            let user = resolve_actor(txn, actor)?;
            let post = active_post(txn, post_id)?;

            let stored = CommentRepository::new(txn).insert(user.id, post.id, comment)?;

            let event = AlarmEvent::new(
                post.owner_id,
                AlarmKind::NewCommentOnPost,
                AlarmArgs::on_post(user.id, post.id),
            );
            let staged = self.alarms.stage(txn, event)?;
            Ok::<_, ServiceError>((Comment::new(stored, (&user).into()), staged))
        })?;

        self.alarms.publish(staged);
        info!(post_id = %post_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    /// Comments on an active post, oldest first.
    pub fn comments(&self, post_id: PostId, request: PageRequest) -> ServiceResult<Page<Comment>> {
        self.store.read(|txn| {
            let post = active_post(txn, post_id)?;
            CommentRepository::new(txn)
                .list_by_post(post.id, request)?
                .try_map(|comment| {
                    let author = author_summary(txn, comment.user_id)?;
                    Ok(Comment::new(comment, author))
                })
        })
    }
}
