// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration, login, identity resolution and the alarm inbox.

use std::sync::Arc;

use tracing::info;

use super::{resolve_actor, ServiceError, ServiceResult};
use crate::auth::{
    AuthError, AuthenticatedUser, IdentityResolver, PasswordEncoder, Role, TokenCodec,
};
use crate::models::{Alarm, User};
use crate::pagination::{Page, PageRequest};
use crate::storage::{AlarmRepository, Store, StoredUser, UserRepository, Visibility};

pub struct UserService {
    store: Arc<Store>,
    tokens: TokenCodec,
    passwords: PasswordEncoder,
}

impl UserService {
    pub fn new(store: Arc<Store>, tokens: TokenCodec, passwords: PasswordEncoder) -> Self {
        Self {
            store,
            tokens,
            passwords,
        }
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    /// Register a new user with role `USER`.
    pub fn join(&self, handle: &str, password: &str) -> ServiceResult<User> {
        // Hash before taking the write lock
        let password_hash = self.passwords.hash(password)?;

        let user = self.store.write(|txn| -> ServiceResult<StoredUser> {
            let users = UserRepository::new(txn);
            if users.handle_taken(handle)? {
                return Err(ServiceError::DuplicateHandle(handle.to_string()));
            }
            Ok(users.insert(handle, password_hash, Role::User)?)
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(User::from(&user))
    }

    /// Check credentials and issue a token.
    pub fn login(&self, handle: &str, password: &str) -> ServiceResult<String> {
        let user = self.load_user_by_handle(handle)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            return Err(ServiceError::InvalidPassword);
        }

        Ok(self.tokens.issue(&user.handle)?)
    }

    /// Active user holding `handle`.
    pub fn load_user_by_handle(&self, handle: &str) -> ServiceResult<StoredUser> {
        self.store.read(|txn| {
            UserRepository::new(txn)
                .find_by_handle(handle, Visibility::ActiveOnly)?
                .ok_or_else(|| ServiceError::UserNotFound(handle.to_string()))
        })
    }

    /// Alarms addressed to the caller, newest first.
    pub fn alarm_list(
        &self,
        actor: &AuthenticatedUser,
        request: PageRequest,
    ) -> ServiceResult<Page<Alarm>> {
        self.store.read(|txn| {
            let user = resolve_actor(txn, actor)?;
            let page = AlarmRepository::new(txn).list_by_recipient(user.id, request)?;
            Ok(page.map(Alarm::from))
        })
    }
}

impl IdentityResolver for UserService {
    fn resolve(&self, handle: &str) -> Result<AuthenticatedUser, AuthError> {
        match self.load_user_by_handle(handle) {
            Ok(user) => Ok(AuthenticatedUser {
                user_id: user.id,
                handle: user.handle,
                role: user.role,
            }),
            Err(ServiceError::UserNotFound(_)) => Err(AuthError::UnknownSubject),
            Err(e) => Err(AuthError::Lookup(e.to_string())),
        }
    }
}
