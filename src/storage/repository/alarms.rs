// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Alarm repository.
//!
//! Alarms are written once per dispatch event and never archived.
//! `alarm_events` remembers which event produced which alarm, so a
//! redelivered event does not create a second alarm.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmArgs, AlarmKind};
use crate::ids::{AlarmId, UserId};
use crate::pagination::{Page, PageRequest};
use crate::storage::database::{
    get_indexed, index_insert, index_page, newest_first_key, next_id, put_record, Snapshot,
    StoreResult, ALARMS, ALARMS_BY_RECIPIENT, ALARM_EVENTS,
};

/// Persisted alarm, owned by its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAlarm {
    pub id: AlarmId,
    pub recipient_id: UserId,
    pub kind: AlarmKind,
    pub args: AlarmArgs,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct AlarmRepository<'a, S: Snapshot> {
    txn: &'a S,
}

impl<'a, S: Snapshot> AlarmRepository<'a, S> {
    pub fn new(txn: &'a S) -> Self {
        Self { txn }
    }

    /// Alarms addressed to `recipient`, newest first.
    pub fn list_by_recipient(
        &self,
        recipient: UserId,
        request: PageRequest,
    ) -> StoreResult<Page<StoredAlarm>> {
        let alarms = self.txn.table(ALARMS)?;
        index_page(self.txn, ALARMS_BY_RECIPIENT, recipient.get(), request, |id| {
            get_indexed(&alarms, id)
        })
    }

    /// Whether the dispatch event has already been persisted.
    pub fn event_recorded(&self, event_id: &str) -> StoreResult<bool> {
        Ok(self.txn.table(ALARM_EVENTS)?.get(event_id)?.is_some())
    }
}

impl AlarmRepository<'_, WriteTransaction> {
    /// Persist the alarm for `event_id` unless that event was already
    /// recorded. Returns `None` for a redelivered event.
    pub fn record_event(
        &self,
        event_id: &str,
        recipient: UserId,
        kind: AlarmKind,
        args: AlarmArgs,
    ) -> StoreResult<Option<StoredAlarm>> {
        if self.event_recorded(event_id)? {
            return Ok(None);
        }

        let now = Utc::now();
        let alarm = StoredAlarm {
            id: AlarmId(next_id(self.txn, "alarms")?),
            recipient_id: recipient,
            kind,
            args,
            created_at: now,
            updated_at: now,
        };

        let id = alarm.id.get();
        put_record(&mut self.txn.open_table(ALARMS)?, id, &alarm)?;
        index_insert(
            self.txn,
            ALARMS_BY_RECIPIENT,
            recipient.get(),
            &newest_first_key(recipient.get(), id),
            id,
        )?;
        self.txn.open_table(ALARM_EVENTS)?.insert(event_id, id)?;
        Ok(Some(alarm))
    }
}
