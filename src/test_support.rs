// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::sync::Arc;

use argon2::Params;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::alarm::{AlarmDispatcher, AlarmEvent};
use crate::auth::{AuthenticatedUser, PasswordEncoder, Role, TokenCodec};
use crate::ids::UserId;
use crate::service::{PostService, UserService};
use crate::state::AppState;
use crate::storage::Store;

pub const TEST_SECRET: &[u8] = b"unit-test-secret-key-at-least-32-bytes";
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Argon2 with minimal cost so tests stay fast.
pub fn fast_passwords() -> PasswordEncoder {
    PasswordEncoder::with_params(Params::new(1024, 1, 1, None).unwrap())
}

pub fn test_codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET, chrono::Duration::hours(1))
}

/// Temporary database plus services wired the way the server wires them.
pub struct TestContext {
    pub state: AppState,
    pub users: Arc<UserService>,
    pub posts: Arc<PostService>,
    _dir: TempDir,
}

impl TestContext {
    /// Inline alarm delivery.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open_in(dir.path()).unwrap());
        let alarms = AlarmDispatcher::inline(store.clone());
        Self::build(dir, store, alarms)
    }

    /// Queued alarm delivery; run an `AlarmWorker` on the receiver.
    pub fn queued() -> (Self, UnboundedReceiver<AlarmEvent>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open_in(dir.path()).unwrap());
        let (alarms, receiver) = AlarmDispatcher::queued(store.clone());
        (Self::build(dir, store, alarms), receiver)
    }

    fn build(dir: TempDir, store: Arc<Store>, alarms: AlarmDispatcher) -> Self {
        let state = AppState::new(store, test_codec(), fast_passwords(), alarms);
        Self {
            users: state.users.clone(),
            posts: state.posts.clone(),
            state,
            _dir: dir,
        }
    }

    /// Register `handle` and return its identity.
    pub fn member(&self, handle: &str) -> AuthenticatedUser {
        let user = self.users.join(handle, TEST_PASSWORD).unwrap();
        AuthenticatedUser {
            user_id: user.id,
            handle: user.handle,
            role: user.role,
        }
    }

    /// Identity that was never registered.
    pub fn identity(&self, id: u64, handle: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId(id),
            handle: handle.to_string(),
            role: Role::User,
        }
    }
}
