//! DrawRecord: one persisted draw.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::CorruptRecord;
use super::name::Name;

/// Identifier assigned by the store when a record is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A name that was drawn and when.
///
/// Created once per successful draw and never mutated; only a full reset
/// removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub id: RecordId,
    pub name: Name,
    pub drawn_at: DateTime<Utc>,
}

impl DrawRecord {
    pub fn new(id: RecordId, name: Name, drawn_at: DateTime<Utc>) -> Self {
        Self { id, name, drawn_at }
    }
}

/// Sort records for display: most recent first, newer id wins on ties.
pub fn sort_newest_first(records: &mut [DrawRecord]) {
    records.sort_by(|a, b| b.drawn_at.cmp(&a.drawn_at).then(b.id.cmp(&a.id)));
}

/// What a store read: the readable records, plus names recovered from rows
/// that were skipped as corrupt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordScan {
    pub records: Vec<DrawRecord>,
    pub unreadable_names: Vec<Name>,
}

impl RecordScan {
    /// Split parsed rows, logging every corrupt one.
    pub fn collect(rows: impl IntoIterator<Item = Result<DrawRecord, CorruptRecord>>) -> Self {
        let mut scan = Self::default();
        for row in rows {
            match row {
                Ok(record) => scan.records.push(record),
                Err(corrupt) => {
                    corrupt.log_skipped();
                    scan.unreadable_names.extend(corrupt.name);
                }
            }
        }
        scan
    }

    /// Every name that counts as drawn, corrupt rows included.
    pub fn used_names(self) -> Vec<Name> {
        self.records
            .into_iter()
            .map(|r| r.name)
            .chain(self.unreadable_names)
            .collect()
    }
}
