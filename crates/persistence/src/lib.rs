//! Persistence mapping, unit of work and audit/event tracking for aggregate
//! roots.
//!
//! Aggregates are mapped onto tables by [`EntityConfiguration`]s collected
//! into a [`Model`]. A [`ContextFactory`] opens one [`UnitOfWork`] per
//! request; its `save` stamps audit columns, harvests domain events, commits
//! through a [`RecordStore`] and dispatches the events afterwards.

pub mod aggregate;
pub mod column;
pub mod compare;
pub mod context;
pub mod convert;
pub mod dispatch;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod interceptor;
pub mod mapping;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;
pub mod tracking;

pub use aggregate::{Aggregate, DomainEvent, DomainEvents, EventSource, HasDomainEvents};
pub use column::{ColumnKind, ColumnType, ColumnValue};
pub use common::AggregateId;
pub use compare::{DefaultComparer, UnorderedListComparer, ValueComparer};
pub use context::{AggregateSet, ContextFactory, ContextFactoryBuilder, UnitOfWork};
pub use convert::{
    ColumnTypeConverter, ConversionError, EnumTextConverter, JsonConverter, ValueConverter,
};
pub use dispatch::{
    DispatchError, EventDispatcher, FanOutDispatcher, InMemoryDispatcher, TracingDispatcher,
};
pub use entity::{
    ColumnSchema, EntityConfiguration, EntityType, EntityTypeBuilder, RESERVED_COLUMNS, RowReader,
    TableSchema,
};
pub use envelope::{EventEnvelope, EventId, Version};
pub use error::{PersistenceError, Result};
pub use interceptor::{AuditInterceptor, DomainEventInterceptor, SaveInterceptor, SavingContext};
pub use mapping::{FieldViolation, Property, PropertyMapping, ViolationKind};
pub use memory::InMemoryStore;
pub use model::{Model, ModelBuilder};
pub use postgres::PostgresStore;
pub use query::RecordQuery;
pub use record::{AuditMetadata, ChangeSet, Record, RecordWrite};
pub use store::RecordStore;
pub use tracking::{EntityState, TrackedEntry};
