// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded social graph database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`, `posts`, `likes`, `comments`, `alarms`: id → JSON record
//! - `user_handles`: handle → user id
//! - `posts_feed`: (0 | !post) → post id, active posts newest first
//! - `posts_by_owner`: (owner | !post) → post id, active posts newest first
//! - `likes_by_user_post`: (user | post) → like id, one per pair
//! - `likes_by_post`: (post | like) → like id, counted
//! - `comments_by_post`: (post | comment) → comment id, insertion order
//! - `alarms_by_recipient`: (recipient | !alarm) → alarm id, newest first
//! - `alarm_events`: dispatch event id → alarm id
//! - `index_counts`: (index name, owner) → number of entries
//! - `sequences`: sequence name → last allocated id
//!
//! Indexes hold active records only. Entries are added and removed through
//! [`index_insert`] and [`index_remove`], which keep `index_counts` in step so
//! page totals never require a scan.
//!
//! redb admits a single write transaction at a time. Every mutation in the
//! service layer runs inside [`Store::write`], so a check-then-insert cannot
//! interleave with another writer.

use std::path::Path;

use redb::{
    Database, Key, ReadOnlyTable, ReadTransaction, ReadableDatabase, ReadableTable, Table, TableHandle,
    TableDefinition, Value, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::record::{Lifecycle, Visibility};
use crate::pagination::{Page, PageRequest};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
pub(crate) const USER_HANDLES: TableDefinition<&str, u64> = TableDefinition::new("user_handles");

pub(crate) const POSTS: TableDefinition<u64, &[u8]> = TableDefinition::new("posts");
pub(crate) const POSTS_FEED: TableDefinition<&[u8], u64> = TableDefinition::new("posts_feed");
pub(crate) const POSTS_BY_OWNER: TableDefinition<&[u8], u64> =
    TableDefinition::new("posts_by_owner");

pub(crate) const LIKES: TableDefinition<u64, &[u8]> = TableDefinition::new("likes");
pub(crate) const LIKES_BY_USER_POST: TableDefinition<&[u8], u64> =
    TableDefinition::new("likes_by_user_post");
pub(crate) const LIKES_BY_POST: TableDefinition<&[u8], u64> =
    TableDefinition::new("likes_by_post");

pub(crate) const COMMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("comments");
pub(crate) const COMMENTS_BY_POST: TableDefinition<&[u8], u64> =
    TableDefinition::new("comments_by_post");

pub(crate) const ALARMS: TableDefinition<u64, &[u8]> = TableDefinition::new("alarms");
pub(crate) const ALARMS_BY_RECIPIENT: TableDefinition<&[u8], u64> =
    TableDefinition::new("alarms_by_recipient");
pub(crate) const ALARM_EVENTS: TableDefinition<&str, u64> = TableDefinition::new("alarm_events");

const INDEX_COUNTS: TableDefinition<(&str, u64), u64> = TableDefinition::new("index_counts");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Secondary index: composite key → record id.
pub(crate) type Index = TableDefinition<'static, &'static [u8], u64>;

/// Owner slot of [`POSTS_FEED`]. Ids start at 1, so no real owner collides.
pub(crate) const FEED_OWNER: u64 = 0;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("data directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dangling index entry: {0}")]
    Dangling(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Composite key `owner_be | child_be`, ascending by child id.
pub(crate) fn pair_key(owner: u64, child: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&owner.to_be_bytes());
    key[8..].copy_from_slice(&child.to_be_bytes());
    key
}

/// Composite key `owner_be | !child_be`.
///
/// Ids are allocated monotonically, so inverting the child id makes a
/// forward scan return the newest entries first.
pub(crate) fn newest_first_key(owner: u64, child: u64) -> [u8; 16] {
    pair_key(owner, !child)
}

/// Inclusive bounds covering every composite key of one owner.
fn owner_bounds(owner: u64) -> ([u8; 16], [u8; 16]) {
    (pair_key(owner, 0), pair_key(owner, u64::MAX))
}

// =============================================================================
// Snapshot
// =============================================================================

/// A consistent view of the database: either a read or a write transaction.
///
/// Repositories implement their queries once against this trait; inside a
/// write transaction those queries observe the transaction's own writes.
pub trait Snapshot {
    type Table<'a, K: Key + 'static, V: Value + 'static>: ReadableTable<K, V>
    where
        Self: 'a;

    fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        definition: TableDefinition<'_, K, V>,
    ) -> StoreResult<Self::Table<'_, K, V>>;
}

impl Snapshot for ReadTransaction {
    type Table<'a, K: Key + 'static, V: Value + 'static>
        = ReadOnlyTable<K, V>
    where
        Self: 'a;

    fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        definition: TableDefinition<'_, K, V>,
    ) -> StoreResult<ReadOnlyTable<K, V>> {
        Ok(self.open_table(definition)?)
    }
}

impl Snapshot for WriteTransaction {
    type Table<'a, K: Key + 'static, V: Value + 'static>
        = Table<'a, K, V>
    where
        Self: 'a;

    fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        definition: TableDefinition<'_, K, V>,
    ) -> StoreResult<Table<'_, K, V>> {
        Ok(self.open_table(definition)?)
    }
}

// =============================================================================
// Record Helpers
// =============================================================================

/// Decode the record stored under `id`, whatever its status.
pub(crate) fn get_record<R: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StoreResult<Option<R>> {
    match table.get(id)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Decode the record stored under `id` if `visibility` admits it.
pub(crate) fn get_visible<R: DeserializeOwned + Lifecycle>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
    visibility: Visibility,
) -> StoreResult<Option<R>> {
    Ok(get_record::<R>(table, id)?.filter(|record| visibility.admits(record.status())))
}

pub(crate) fn put_record<R: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    record: &R,
) -> StoreResult<()> {
    let json = serde_json::to_vec(record)?;
    table.insert(id, json.as_slice())?;
    Ok(())
}

/// Allocate the next id of `sequence`, starting at 1.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

/// Decode a record an index entry points at.
pub(crate) fn get_indexed<R: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StoreResult<R> {
    get_record(table, id)?.ok_or_else(|| StoreError::Dangling(format!("record {id}")))
}

// =============================================================================
// Index Helpers
// =============================================================================

/// Add `id` to `owner`'s entries in `index`.
pub(crate) fn index_insert(
    txn: &WriteTransaction,
    index: Index,
    owner: u64,
    key: &[u8],
    id: u64,
) -> StoreResult<()> {
    let replaced = txn.open_table(index)?.insert(key, id)?.is_some();
    if !replaced {
        adjust_count(txn, index, owner, 1)?;
    }
    Ok(())
}

/// Drop the entry under `key`. Returns whether one was present.
pub(crate) fn index_remove(
    txn: &WriteTransaction,
    index: Index,
    owner: u64,
    key: &[u8],
) -> StoreResult<bool> {
    let removed = txn.open_table(index)?.remove(key)?.is_some();
    if removed {
        adjust_count(txn, index, owner, -1)?;
    }
    Ok(removed)
}

/// Number of entries `owner` has in `index`.
pub(crate) fn index_count<S: Snapshot>(txn: &S, index: Index, owner: u64) -> StoreResult<u64> {
    let counts = txn.table(INDEX_COUNTS)?;
    let count = counts
        .get((index.name(), owner))?
        .map(|v| v.value())
        .unwrap_or(0);
    Ok(count)
}

fn adjust_count(txn: &WriteTransaction, index: Index, owner: u64, delta: i64) -> StoreResult<()> {
    let mut counts = txn.open_table(INDEX_COUNTS)?;
    let key = (index.name(), owner);
    let current = counts.get(key)?.map(|v| v.value()).unwrap_or(0);
    match current.saturating_add_signed(delta) {
        0 => {
            counts.remove(key)?;
        }
        next => {
            counts.insert(key, next)?;
        }
    }
    Ok(())
}

/// One page of `owner`'s entries in `index`, in key order.
///
/// The range is walked only up to the end of the requested page and `load`
/// runs once per id on it. The total is the maintained entry count.
pub(crate) fn index_page<S: Snapshot, R>(
    txn: &S,
    index: Index,
    owner: u64,
    request: PageRequest,
    mut load: impl FnMut(u64) -> StoreResult<R>,
) -> StoreResult<Page<R>> {
    let total = index_count(txn, index, owner)?;
    let (start, end) = owner_bounds(owner);
    let entries = txn.table(index)?;

    let mut content = Vec::with_capacity(request.limit());
    for entry in entries
        .range(start.as_slice()..=end.as_slice())?
        .skip(request.offset())
        .take(request.limit())
    {
        let (_, id) = entry?;
        content.push(load(id.value())?);
    }

    Ok(Page::new(content, request, total))
}

// =============================================================================
// Store
// =============================================================================

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "sns.redb";

/// Embedded ACID database holding every entity of the service.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(USERS)?;
            write_txn.open_table(USER_HANDLES)?;
            write_txn.open_table(POSTS)?;
            write_txn.open_table(POSTS_FEED)?;
            write_txn.open_table(POSTS_BY_OWNER)?;
            write_txn.open_table(LIKES)?;
            write_txn.open_table(LIKES_BY_USER_POST)?;
            write_txn.open_table(LIKES_BY_POST)?;
            write_txn.open_table(COMMENTS)?;
            write_txn.open_table(COMMENTS_BY_POST)?;
            write_txn.open_table(ALARMS)?;
            write_txn.open_table(ALARMS_BY_RECIPIENT)?;
            write_txn.open_table(ALARM_EVENTS)?;
            write_txn.open_table(INDEX_COUNTS)?;
            write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open the database file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    /// Run `work` against a read snapshot.
    pub fn read<T, E>(&self, work: impl FnOnce(&ReadTransaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let txn = self.db.begin_read().map_err(StoreError::from)?;
        work(&txn)
    }

    /// Run `work` as one unit of work.
    ///
    /// Commits when `work` returns `Ok`; aborts otherwise, leaving no trace of
    /// anything `work` wrote.
    pub fn write<T, E>(&self, work: impl FnOnce(&WriteTransaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let txn = self.db.begin_write().map_err(StoreError::from)?;
        match work(&txn) {
            Ok(value) => {
                txn.commit().map_err(StoreError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = txn.abort() {
                    warn!(error = %abort, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    /// Cheap liveness probe used by the readiness endpoint.
    pub fn ping(&self) -> StoreResult<()> {
        let txn = self.db.begin_read()?;
        txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn sequences_start_at_one_and_increase() {
        let (store, _dir) = temp_store();
        let ids = store
            .write(|txn| -> StoreResult<_> {
                Ok((next_id(txn, "posts")?, next_id(txn, "posts")?, next_id(txn, "users")?))
            })
            .unwrap();
        assert_eq!(ids, (1, 2, 1));
    }

    #[test]
    fn failed_unit_of_work_is_rolled_back() {
        let (store, _dir) = temp_store();

        let result: StoreResult<()> = store.write(|txn| {
            next_id(txn, "posts")?;
            Err(StoreError::Dangling("forced".to_string()))
        });
        assert!(result.is_err());

        let next = store.write(|txn| next_id(txn, "posts")).unwrap();
        assert_eq!(next, 1, "aborted allocation must not be visible");
    }

    #[test]
    fn newest_first_keys_sort_descending() {
        let older = newest_first_key(7, 1);
        let newer = newest_first_key(7, 2);
        assert!(newer < older);

        let other_owner = newest_first_key(8, 1);
        assert!(older < other_owner, "owners stay grouped");
    }

    fn seed_index(store: &Store, entries: &[(u64, u64)]) {
        store
            .write(|txn| -> StoreResult<()> {
                for &(post, comment) in entries {
                    index_insert(txn, COMMENTS_BY_POST, post, &pair_key(post, comment), comment)?;
                }
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn index_page_only_returns_that_owner() {
        let (store, _dir) = temp_store();
        seed_index(&store, &[(1, 10), (1, 11), (2, 12), (1, 13)]);

        let page = store
            .read(|txn| index_page(txn, COMMENTS_BY_POST, 1, PageRequest::default(), Ok))
            .unwrap();
        assert_eq!(page.content, vec![10, 11, 13]);
        assert_eq!(page.total_elements, 3);

        let other = store
            .read(|txn| index_count(txn, COMMENTS_BY_POST, 2))
            .unwrap();
        assert_eq!(other, 1);
    }

    #[test]
    fn index_page_loads_only_the_requested_page() {
        let (store, _dir) = temp_store();
        let entries: Vec<_> = (1..=25u64).map(|id| (7, id)).collect();
        seed_index(&store, &entries);

        let mut loaded = Vec::new();
        let page = store
            .read(|txn| {
                index_page(txn, COMMENTS_BY_POST, 7, PageRequest::new(1, 10), |id| {
                    loaded.push(id);
                    Ok(id)
                })
            })
            .unwrap();

        assert_eq!(page.content, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(loaded, page.content, "ids off the page are never loaded");
    }

    #[test]
    fn removing_entries_keeps_counts_in_step() {
        let (store, _dir) = temp_store();
        seed_index(&store, &[(3, 1), (3, 2)]);

        let (removed, missing) = store
            .write(|txn| -> StoreResult<_> {
                Ok((
                    index_remove(txn, COMMENTS_BY_POST, 3, &pair_key(3, 1))?,
                    index_remove(txn, COMMENTS_BY_POST, 3, &pair_key(3, 1))?,
                ))
            })
            .unwrap();
        assert!(removed);
        assert!(!missing);

        // Re-inserting an existing key does not double count
        seed_index(&store, &[(3, 2)]);

        let page = store
            .read(|txn| index_page(txn, COMMENTS_BY_POST, 3, PageRequest::default(), Ok))
            .unwrap();
        assert_eq!(page.content, vec![2]);
        assert_eq!(page.total_elements, 1);
    }

    #[test]
    fn ping_succeeds_on_fresh_store() {
        let (store, _dir) = temp_store();
        store.ping().unwrap();
    }
}
