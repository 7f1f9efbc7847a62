use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::column::ColumnValue;
use crate::{AggregateId, Version};

/// Audit columns present on every aggregate table.
///
/// Only the save pipeline writes these; domain code can read them but has
/// no way to set them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    created_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    modified_at: Option<DateTime<Utc>>,
    modified_by: Option<String>,
}

impl AuditMetadata {
    pub(crate) fn restore(
        created_at: Option<DateTime<Utc>>,
        created_by: Option<String>,
        modified_at: Option<DateTime<Utc>>,
        modified_by: Option<String>,
    ) -> Self {
        Self {
            created_at,
            created_by,
            modified_at,
            modified_by,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    pub fn modified_by(&self) -> Option<&str> {
        self.modified_by.as_deref()
    }

    /// Stamps a row that is being inserted. Modified columns start equal to
    /// the created ones.
    pub(crate) fn stamp_created(&mut self, at: DateTime<Utc>, by: Option<String>) {
        self.created_at = Some(at);
        self.created_by = by.clone();
        self.modified_at = Some(at);
        self.modified_by = by;
    }

    /// Stamps a row that is being updated; created columns are left alone.
    pub(crate) fn stamp_modified(&mut self, at: DateTime<Utc>, by: Option<String>) {
        self.modified_at = Some(at);
        self.modified_by = by;
    }
}

/// One stored row of an aggregate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub table: String,
    pub id: AggregateId,
    pub version: Version,
    pub audit: AuditMetadata,
    /// Mapped columns keyed by column name. Audit columns are not included.
    pub columns: BTreeMap<String, ColumnValue>,
}

impl Record {
    pub fn column(&self, name: &str) -> Option<&ColumnValue> {
        self.columns.get(name)
    }
}

/// A pending change to a single row.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    Insert(Record),

    /// Replaces the row if it is still at `expected_version`.
    Update {
        record: Record,
        expected_version: Version,
    },

    /// Removes the row if it is still at `expected_version`.
    Delete {
        table: String,
        id: AggregateId,
        expected_version: Version,
    },
}

impl RecordWrite {
    pub fn table(&self) -> &str {
        match self {
            RecordWrite::Insert(record) | RecordWrite::Update { record, .. } => &record.table,
            RecordWrite::Delete { table, .. } => table,
        }
    }

    pub fn id(&self) -> AggregateId {
        match self {
            RecordWrite::Insert(record) | RecordWrite::Update { record, .. } => record.id,
            RecordWrite::Delete { id, .. } => *id,
        }
    }
}

/// Every write of one save, committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    writes: Vec<RecordWrite>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: RecordWrite) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordWrite> {
        self.writes.iter()
    }

    pub fn into_writes(self) -> Vec<RecordWrite> {
        self.writes
    }
}

impl FromIterator<RecordWrite> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = RecordWrite>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}
