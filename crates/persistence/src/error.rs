use thiserror::Error;

use crate::convert::ConversionError;
use crate::mapping::FieldViolation;
use crate::{AggregateId, Version};

/// Errors surfaced by the mapping layer, the unit of work and the record stores.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A mapped property violates its declared constraints.
    /// Raised before anything is sent to the store.
    #[error("Validation failed for {entity} {id}: {}", join_violations(.violations))]
    Validation {
        entity: &'static str,
        id: AggregateId,
        violations: Vec<FieldViolation>,
    },

    /// A stored value could not be turned back into its domain representation.
    #[error("Conversion error in {table}.{column}: {source}")]
    Conversion {
        table: String,
        column: String,
        source: ConversionError,
    },

    /// Another unit of work changed or removed the row since it was loaded.
    #[error(
        "Concurrency conflict on {table} {id}: expected version {expected}, found {}",
        describe_actual(.actual)
    )]
    ConcurrencyConflict {
        table: String,
        id: AggregateId,
        expected: Version,
        actual: Option<Version>,
    },

    /// A row with this primary key already exists.
    #[error("Duplicate key in {table}: {id}")]
    DuplicateKey { table: String, id: AggregateId },

    /// The aggregate is already tracked by this unit of work.
    #[error("{entity} {id} is already tracked")]
    AlreadyTracked {
        entity: &'static str,
        id: AggregateId,
    },

    /// The aggregate is not tracked by this unit of work.
    #[error("{entity} {id} is not tracked")]
    NotTracked {
        entity: &'static str,
        id: AggregateId,
    },

    /// No entity configuration was registered for the aggregate type.
    #[error("No configuration registered for {0}")]
    NotConfigured(&'static str),

    /// An entity configuration is inconsistent (duplicate or reserved column).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The store could not be reached. Safe to retry.
    #[error("Store unavailable: {0}")]
    Connectivity(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PersistenceError {
    /// True for failures where re-running the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PersistenceError::ConcurrencyConflict { .. } | PersistenceError::Connectivity(_)
        )
    }

    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, PersistenceError::ConcurrencyConflict { .. })
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => PersistenceError::Connectivity(err.to_string()),
            other => PersistenceError::Database(other),
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_actual(actual: &Option<Version>) -> String {
    match actual {
        Some(version) => version.to_string(),
        None => "no row".to_string(),
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
