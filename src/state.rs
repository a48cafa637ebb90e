// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::alarm::AlarmDispatcher;
use crate::auth::{AccessPolicy, PasswordEncoder, TokenCodec};
use crate::service::{PostService, UserService};
use crate::storage::Store;

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub users: Arc<UserService>,
    pub posts: Arc<PostService>,
    pub alarms: AlarmDispatcher,
    pub policy: Arc<AccessPolicy>,
    pub dev_routes: bool,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        tokens: TokenCodec,
        passwords: PasswordEncoder,
        alarms: AlarmDispatcher,
    ) -> Self {
        Self {
            users: Arc::new(UserService::new(store.clone(), tokens, passwords)),
            posts: Arc::new(PostService::new(store.clone(), alarms.clone())),
            store,
            alarms,
            policy: Arc::new(AccessPolicy::standard()),
            dev_routes: false,
        }
    }

    /// Mount the developer alarm route.
    pub fn with_dev_routes(mut self, enabled: bool) -> Self {
        self.dev_routes = enabled;
        self
    }
}
