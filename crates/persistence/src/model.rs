use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::aggregate::Aggregate;
use crate::entity::{EntityConfiguration, EntityType, RESERVED_COLUMNS, TableSchema};
use crate::{PersistenceError, Result};

/// Every configured entity type, built once at startup.
#[derive(Clone, Default)]
pub struct Model {
    entity_types: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    schemas: Vec<TableSchema>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// Looks up the mapping of `A`.
    pub fn entity_type<A: Aggregate>(&self) -> Result<Arc<EntityType<A>>> {
        self.entity_types
            .get(&TypeId::of::<A>())
            .cloned()
            .and_then(|erased| erased.downcast::<EntityType<A>>().ok())
            .ok_or(PersistenceError::NotConfigured(A::aggregate_type()))
    }

    pub fn is_configured<A: Aggregate>(&self) -> bool {
        self.entity_types.contains_key(&TypeId::of::<A>())
    }

    /// Table layouts in configuration order.
    pub fn schemas(&self) -> &[TableSchema] {
        &self.schemas
    }
}

/// Collects entity configurations and checks them for consistency.
#[derive(Default)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    /// Applies one entity configuration.
    ///
    /// Fails when the aggregate is configured twice, when two aggregates
    /// share a table, or when a mapped column repeats or collides with one
    /// of the reserved id/version/audit columns.
    pub fn apply<C: EntityConfiguration>(mut self) -> Result<Self> {
        let entity_type = C::configure();
        let schema = entity_type.schema();

        if self.model.is_configured::<C::Entity>() {
            return Err(PersistenceError::InvalidConfiguration(format!(
                "{} is configured twice",
                entity_type.name()
            )));
        }
        if self.model.schemas.iter().any(|s| s.table == schema.table) {
            return Err(PersistenceError::InvalidConfiguration(format!(
                "table {} is mapped twice",
                schema.table
            )));
        }

        let mut seen = HashSet::new();
        for column in &schema.columns {
            if RESERVED_COLUMNS.contains(&column.name) {
                return Err(PersistenceError::InvalidConfiguration(format!(
                    "{}.{} collides with a reserved column",
                    schema.table, column.name
                )));
            }
            if !seen.insert(column.name) {
                return Err(PersistenceError::InvalidConfiguration(format!(
                    "{}.{} is mapped twice",
                    schema.table, column.name
                )));
            }
        }

        tracing::debug!(entity = entity_type.name(), table = schema.table, "entity configured");
        self.model.schemas.push(schema);
        self.model
            .entity_types
            .insert(TypeId::of::<C::Entity>(), Arc::new(entity_type));
        Ok(self)
    }

    pub fn build(self) -> Model {
        self.model
    }
}
