//! Entity types: the per-aggregate mapping applied once at startup.

use std::collections::BTreeMap;

use crate::aggregate::Aggregate;
use crate::column::{ColumnKind, ColumnValue};
use crate::mapping::{Property, PropertyMapping, check_constraints};
use crate::record::Record;
use crate::{AggregateId, PersistenceError, Result};

/// Columns every aggregate table carries in addition to its mapped ones.
pub const RESERVED_COLUMNS: [&str; 6] = [
    "id",
    "version",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];

/// A mapped column as the store needs to know it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    pub max_length: Option<usize>,
}

/// Table layout derived from an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Read access to a stored row while materializing an aggregate.
pub struct RowReader<'a> {
    record: &'a Record,
}

impl<'a> RowReader<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self { record }
    }

    pub fn id(&self) -> AggregateId {
        self.record.id
    }

    /// Reads and converts the column mapped by `property`.
    ///
    /// A missing column reads as `NULL`.
    pub fn read<A, T: 'static>(&self, property: &Property<A, T>) -> Result<T> {
        let value = self
            .record
            .column(property.column())
            .unwrap_or(&ColumnValue::Null);
        property
            .converter()
            .from_provider(value)
            .map_err(|source| PersistenceError::Conversion {
                table: self.record.table.clone(),
                column: property.column().to_string(),
                source,
            })
    }
}

/// Rebuilds an aggregate from a stored row.
pub type Materializer<A> = fn(&RowReader<'_>) -> Result<A>;

/// Declarative mapping of one aggregate type onto one table.
pub struct EntityType<A> {
    name: &'static str,
    table: &'static str,
    properties: Vec<Box<dyn PropertyMapping<A>>>,
    materializer: Materializer<A>,
}

impl<A: Aggregate> EntityType<A> {
    pub fn builder(table: &'static str) -> EntityTypeBuilder<A> {
        EntityTypeBuilder {
            table,
            properties: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn schema(&self) -> TableSchema {
        TableSchema {
            table: self.table,
            columns: self
                .properties
                .iter()
                .map(|p| ColumnSchema {
                    name: p.column(),
                    kind: p.kind(),
                    required: p.is_required(),
                    max_length: p.max_length(),
                })
                .collect(),
        }
    }

    /// Checks every declared constraint, reporting all violations at once.
    pub fn validate(&self, entity: &A) -> Result<()> {
        let mut violations = Vec::new();
        for property in &self.properties {
            let value = self.write_property(property.as_ref(), entity)?;
            check_constraints(property.as_ref(), &value, &mut violations);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PersistenceError::Validation {
                entity: self.name,
                id: entity.id(),
                violations,
            })
        }
    }

    /// Converts every mapped property to its stored form.
    pub fn to_columns(&self, entity: &A) -> Result<BTreeMap<String, ColumnValue>> {
        self.properties
            .iter()
            .map(|p| {
                let value = self.write_property(p.as_ref(), entity)?;
                Ok((p.column().to_string(), value))
            })
            .collect()
    }

    /// Columns whose value differs according to their comparer.
    pub fn changed_columns(&self, current: &A, original: &A) -> Vec<&'static str> {
        self.properties
            .iter()
            .filter(|p| p.differs(current, original))
            .map(|p| p.column())
            .collect()
    }

    pub fn has_changes(&self, current: &A, original: &A) -> bool {
        self.properties.iter().any(|p| p.differs(current, original))
    }

    pub fn materialize(&self, record: &Record) -> Result<A> {
        (self.materializer)(&RowReader::new(record))
    }

    fn write_property(&self, property: &dyn PropertyMapping<A>, entity: &A) -> Result<ColumnValue> {
        property
            .write(entity)
            .map_err(|source| PersistenceError::Conversion {
                table: self.table.to_string(),
                column: property.column().to_string(),
                source,
            })
    }
}

/// Builder returned by [`EntityType::builder`].
pub struct EntityTypeBuilder<A> {
    table: &'static str,
    properties: Vec<Box<dyn PropertyMapping<A>>>,
}

impl<A: Aggregate> EntityTypeBuilder<A> {
    pub fn property<T: Send + Sync + 'static>(mut self, property: Property<A, T>) -> Self {
        self.properties.push(Box::new(property));
        self
    }

    pub fn build(self, materializer: Materializer<A>) -> EntityType<A> {
        EntityType {
            name: A::aggregate_type(),
            table: self.table,
            properties: self.properties,
            materializer,
        }
    }
}

/// Mapping configuration for one aggregate type.
///
/// Implementations are pure declarations; they are applied once when the
/// [`Model`](crate::Model) is built.
pub trait EntityConfiguration {
    type Entity: Aggregate;

    fn configure() -> EntityType<Self::Entity>;
}
