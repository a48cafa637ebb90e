// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SNS Server - Social Network Backend
//!
//! Bearer-token authentication in front of a post, like and comment service
//! that notifies post owners through alarms. State lives in an embedded redb
//! database.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, request authenticator and access policy
//! - `service` - Business operations on users, posts, likes and comments
//! - `alarm` - Alarm dispatch, inline or through a background worker
//! - `storage` - Transactional storage (redb)

pub mod alarm;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod pagination;
pub mod service;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod test_support;
