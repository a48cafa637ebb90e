// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Record lifecycle: active records and soft-deleted (archived) ones.
//!
//! Archiving never removes a row. Every read states which records it wants
//! through [`Visibility`], so "deleted but retained" data only shows up where
//! a caller asks for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state stored with every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Archived { at: DateTime<Utc> },
}

impl RecordStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    /// When the record was archived, if it was.
    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordStatus::Active => None,
            RecordStatus::Archived { at } => Some(*at),
        }
    }
}

/// Which records a read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ActiveOnly,
    IncludeArchived,
}

impl Visibility {
    pub fn admits(self, status: &RecordStatus) -> bool {
        match self {
            Visibility::ActiveOnly => status.is_active(),
            Visibility::IncludeArchived => true,
        }
    }
}

/// Implemented by every stored entity.
pub trait Lifecycle {
    fn status(&self) -> &RecordStatus;
}
