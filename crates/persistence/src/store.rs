use std::collections::HashSet;

use async_trait::async_trait;

use crate::entity::TableSchema;
use crate::query::RecordQuery;
use crate::record::{ChangeSet, Record};
use crate::{AggregateId, PersistenceError, Result};

/// Core trait for row store implementations.
///
/// A record store persists the rows produced by a unit of work and reads
/// them back. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Applies every write of `changes` atomically - either all succeed or
    /// none do.
    ///
    /// Updates and deletes fail with `ConcurrencyConflict` when the stored
    /// version differs from the expected one. Returns the number of rows
    /// affected.
    async fn commit(&self, changes: ChangeSet) -> Result<usize>;

    /// Retrieves one row by primary key.
    async fn fetch(&self, schema: &TableSchema, id: AggregateId) -> Result<Option<Record>>;

    /// Retrieves every row of a table, ordered by creation time.
    async fn fetch_all(&self, schema: &TableSchema) -> Result<Vec<Record>>;

    /// Retrieves the rows matching a query.
    async fn query(&self, schema: &TableSchema, query: &RecordQuery) -> Result<Vec<Record>>;

    /// Counts the rows of a table.
    async fn count(&self, schema: &TableSchema) -> Result<usize>;
}

/// Rejects a change set that touches the same row twice.
pub fn validate_change_set(changes: &ChangeSet) -> Result<()> {
    let mut seen = HashSet::new();
    for write in changes.iter() {
        if !seen.insert((write.table(), write.id())) {
            return Err(PersistenceError::InvalidConfiguration(format!(
                "change set writes {} {} more than once",
                write.table(),
                write.id()
            )));
        }
    }
    Ok(())
}
