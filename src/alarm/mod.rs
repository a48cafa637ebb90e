// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Alarm Dispatch
//!
//! Alarms tell a user that someone interacted with their content. Each
//! interaction produces one [`AlarmEvent`]; the [`AlarmDispatcher`] turns it
//! into a persisted alarm either inside the triggering transaction (inline)
//! or through a channel drained by the [`AlarmWorker`] (queued).
//!
//! Persisting is keyed by the event id, so handing the same event over twice
//! yields one alarm.

pub mod dispatch;
pub mod worker;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ids::{PostId, UserId};

pub use dispatch::{AlarmDispatcher, DeliveryMode, StagedAlarm};
pub use worker::{AlarmWorker, DeliveryReport};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmKind {
    NewLikeOnPost,
    NewCommentOnPost,
}

impl AlarmKind {
    /// Display text shown to the recipient.
    pub fn text(self) -> &'static str {
        match self {
            AlarmKind::NewLikeOnPost => "new like!",
            AlarmKind::NewCommentOnPost => "new comment!",
        }
    }
}

/// Kind-specific payload: who acted, on what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlarmArgs {
    /// User who liked or commented
    pub from_user_id: UserId,
    /// Affected entity; a post id for both current kinds
    pub target_id: u64,
}

impl AlarmArgs {
    pub fn on_post(from: UserId, post: PostId) -> Self {
        Self {
            from_user_id: from,
            target_id: post.get(),
        }
    }
}

/// One notification to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEvent {
    pub event_id: Uuid,
    pub recipient_id: UserId,
    pub kind: AlarmKind,
    pub args: AlarmArgs,
}

impl AlarmEvent {
    pub fn new(recipient: UserId, kind: AlarmKind, args: AlarmArgs) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            recipient_id: recipient,
            kind,
            args,
        }
    }
}
