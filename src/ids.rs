// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable entity identifiers.
//!
//! Every persisted entity is keyed by a monotonically increasing `u64`
//! allocated inside the write transaction that creates it. The newtypes keep
//! a post id from being passed where a user id is expected; ownership checks
//! compare these values, never display handles.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw key value.
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

entity_id!(
    /// Primary key of a user. Stable across handle changes.
    UserId
);
entity_id!(
    /// Primary key of a post.
    PostId
);
entity_id!(
    /// Primary key of a like.
    LikeId
);
entity_id!(
    /// Primary key of a comment.
    CommentId
);
entity_id!(
    /// Primary key of an alarm.
    AlarmId
);
