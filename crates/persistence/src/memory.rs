use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entity::TableSchema;
use crate::query::{RecordQuery, sort_records};
use crate::record::{ChangeSet, Record, RecordWrite};
use crate::store::{RecordStore, validate_change_set};
use crate::{AggregateId, PersistenceError, Result, Version};

type Tables = HashMap<String, BTreeMap<AggregateId, Record>>;

/// In-memory record store implementation for testing.
///
/// Provides the same commit semantics as the PostgreSQL implementation:
/// version checks, duplicate-key detection and all-or-nothing commits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with a connectivity error until
    /// switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Writes a row directly, bypassing version checks.
    pub async fn seed(&self, record: Record) {
        self.tables
            .write()
            .await
            .entry(record.table.clone())
            .or_default()
            .insert(record.id, record);
    }

    /// Returns the number of rows stored in `table`.
    pub async fn record_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        self.tables.write().await.clear();
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Connectivity(
                "in-memory store is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn check_write(tables: &Tables, write: &RecordWrite) -> Result<()> {
        let current = tables
            .get(write.table())
            .and_then(|rows| rows.get(&write.id()))
            .map(|row| row.version);

        match write {
            RecordWrite::Insert(record) => match current {
                Some(_) => Err(PersistenceError::DuplicateKey {
                    table: record.table.clone(),
                    id: record.id,
                }),
                None => Ok(()),
            },
            RecordWrite::Update {
                expected_version, ..
            }
            | RecordWrite::Delete {
                expected_version, ..
            } => check_version(write, *expected_version, current),
        }
    }
}

fn check_version(write: &RecordWrite, expected: Version, actual: Option<Version>) -> Result<()> {
    if actual == Some(expected) {
        return Ok(());
    }
    Err(PersistenceError::ConcurrencyConflict {
        table: write.table().to_string(),
        id: write.id(),
        expected,
        actual,
    })
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn commit(&self, changes: ChangeSet) -> Result<usize> {
        self.ensure_available()?;
        validate_change_set(&changes)?;

        let mut tables = self.tables.write().await;

        // Nothing is applied unless every write is valid
        for write in changes.iter() {
            Self::check_write(&tables, write)?;
        }

        let affected = changes.len();
        for write in changes.into_writes() {
            match write {
                RecordWrite::Insert(record) | RecordWrite::Update { record, .. } => {
                    tables
                        .entry(record.table.clone())
                        .or_default()
                        .insert(record.id, record);
                }
                RecordWrite::Delete { table, id, .. } => {
                    if let Some(rows) = tables.get_mut(&table) {
                        rows.remove(&id);
                    }
                }
            }
        }

        Ok(affected)
    }

    async fn fetch(&self, schema: &TableSchema, id: AggregateId) -> Result<Option<Record>> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(schema.table)
            .and_then(|rows| rows.get(&id))
            .cloned())
    }

    async fn fetch_all(&self, schema: &TableSchema) -> Result<Vec<Record>> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let mut records: Vec<Record> = tables
            .get(schema.table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        sort_records(&mut records);
        Ok(records)
    }

    async fn query(&self, schema: &TableSchema, query: &RecordQuery) -> Result<Vec<Record>> {
        self.ensure_available()?;
        let tables = self.tables.read().await;
        let records: Vec<Record> = tables
            .get(schema.table)
            .map(|rows| {
                rows.values()
                    .filter(|record| query.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.page(records))
    }

    async fn count(&self, schema: &TableSchema) -> Result<usize> {
        self.ensure_available()?;
        Ok(self.record_count(schema.table).await)
    }
}
