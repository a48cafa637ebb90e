// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Handles are unique among active users. The `user_handles` index points at
//! the latest account registered under a handle.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::ids::UserId;
use crate::storage::database::{
    get_visible, next_id, put_record, Snapshot, StoreResult, USERS, USER_HANDLES,
};
use crate::storage::record::{Lifecycle, RecordStatus, Visibility};

/// Persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: UserId,
    pub handle: String,
    /// Argon2 PHC string. Never leaves the service layer.
    pub password_hash: String,
    pub role: Role,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle for StoredUser {
    fn status(&self) -> &RecordStatus {
        &self.status
    }
}

pub struct UserRepository<'a, S: Snapshot> {
    txn: &'a S,
}

impl<'a, S: Snapshot> UserRepository<'a, S> {
    pub fn new(txn: &'a S) -> Self {
        Self { txn }
    }

    pub fn get(&self, id: UserId, visibility: Visibility) -> StoreResult<Option<StoredUser>> {
        get_visible(&self.txn.table(USERS)?, id.get(), visibility)
    }

    /// Look up the account currently holding `handle`.
    pub fn find_by_handle(
        &self,
        handle: &str,
        visibility: Visibility,
    ) -> StoreResult<Option<StoredUser>> {
        let id = match self.txn.table(USER_HANDLES)?.get(handle)? {
            Some(id) => id.value(),
            None => return Ok(None),
        };
        get_visible(&self.txn.table(USERS)?, id, visibility)
    }

    /// Whether an active account holds `handle`.
    pub fn handle_taken(&self, handle: &str) -> StoreResult<bool> {
        Ok(self
            .find_by_handle(handle, Visibility::ActiveOnly)?
            .is_some())
    }
}

impl UserRepository<'_, WriteTransaction> {
    /// Insert a new active user. The caller checks [`Self::handle_taken`]
    /// inside the same transaction.
    pub fn insert(&self, handle: &str, password_hash: String, role: Role) -> StoreResult<StoredUser> {
        let now = Utc::now();
        let user = StoredUser {
            id: UserId(next_id(self.txn, "users")?),
            handle: handle.to_string(),
            password_hash,
            role,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
        };

        put_record(&mut self.txn.open_table(USERS)?, user.id.get(), &user)?;
        self.txn
            .open_table(USER_HANDLES)?
            .insert(handle, user.id.get())?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Store, StoreError};

    fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn insert_and_find_by_handle() {
        let (store, _dir) = temp_store();
        let created = store
            .write(|txn| UserRepository::new(txn).insert("alice", "hash".into(), Role::User))
            .unwrap();

        let found = store
            .read(|txn| UserRepository::new(txn).find_by_handle("alice", Visibility::ActiveOnly))
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(found.id, UserId(1));
    }

    #[test]
    fn archived_user_is_only_visible_when_asked() {
        let (store, _dir) = temp_store();
        let alice = store
            .write(|txn| UserRepository::new(txn).insert("alice", "hash".into(), Role::User))
            .unwrap();

        let mut archived = alice.clone();
        archived.status = RecordStatus::Archived { at: Utc::now() };
        store
            .write(|txn| put_record(&mut txn.open_table(USERS)?, alice.id.get(), &archived))
            .unwrap();

        let (active, taken, any) = store
            .read(|txn| -> Result<_, StoreError> {
                let repo = UserRepository::new(txn);
                Ok((
                    repo.find_by_handle("alice", Visibility::ActiveOnly)?,
                    repo.handle_taken("alice")?,
                    repo.get(alice.id, Visibility::IncludeArchived)?,
                ))
            })
            .unwrap();

        assert!(active.is_none());
        assert!(!taken);
        assert!(any.unwrap().status.archived_at().is_some());
    }

    #[test]
    fn reads_inside_write_see_own_inserts() {
        let (store, _dir) = temp_store();
        let taken = store
            .write(|txn| -> StoreResult<bool> {
                let repo = UserRepository::new(txn);
                repo.insert("bob", "hash".into(), Role::User)?;
                repo.handle_taken("bob")
            })
            .unwrap();
        assert!(taken);
    }
}
