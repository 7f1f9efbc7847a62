//! Change tracking for aggregates held by a unit of work.

use std::any::Any;
use std::sync::Arc;

use crate::aggregate::{Aggregate, EventSource};
use crate::entity::EntityType;
use crate::record::{AuditMetadata, Record, RecordWrite};
use crate::{AggregateId, Result, Version};

/// Lifecycle state of a tracked aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// New; inserted on the next save.
    Added,
    /// Loaded from the store and not changed since.
    Unchanged,
    /// Loaded and changed; updated on the next save.
    Modified,
    /// Marked for removal; deleted on the next save.
    Deleted,
}

impl EntityState {
    /// True for states that produce a write on save.
    pub fn is_pending(&self) -> bool {
        !matches!(self, EntityState::Unchanged)
    }
}

/// A tracked aggregate as seen by save interceptors.
pub trait TrackedEntry: Send + Sync {
    fn entity_name(&self) -> &'static str;

    fn id(&self) -> AggregateId;

    fn state(&self) -> EntityState;

    fn audit(&self) -> &AuditMetadata;

    fn audit_mut(&mut self) -> &mut AuditMetadata;

    /// The aggregate's event capability, if it has one.
    fn event_source(&mut self) -> Option<&mut dyn EventSource>;
}

/// Operations the unit of work needs beyond [`TrackedEntry`].
pub(crate) trait EntryOps: TrackedEntry {
    fn detect_changes(&mut self);

    fn validate(&self) -> Result<()>;

    /// The write this entry contributes to the next commit.
    fn to_write(&self) -> Result<Option<RecordWrite>>;

    /// Called once the commit succeeded.
    fn accept_changes(&mut self);

    fn set_audit(&mut self, audit: AuditMetadata);

    fn as_tracked_mut(&mut self) -> &mut dyn TrackedEntry;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct Entry<A: Aggregate> {
    entity_type: Arc<EntityType<A>>,
    pub(crate) current: A,
    original: Option<A>,
    pub(crate) state: EntityState,
    pub(crate) version: Version,
    audit: AuditMetadata,
}

impl<A: Aggregate> Entry<A> {
    pub(crate) fn added(entity_type: Arc<EntityType<A>>, aggregate: A) -> Self {
        Self {
            entity_type,
            current: aggregate,
            original: None,
            state: EntityState::Added,
            version: Version::initial(),
            audit: AuditMetadata::default(),
        }
    }

    pub(crate) fn loaded(entity_type: Arc<EntityType<A>>, record: Record) -> Result<Self> {
        let current = entity_type.materialize(&record)?;
        Ok(Self {
            entity_type,
            original: Some(current.clone()),
            current,
            state: EntityState::Unchanged,
            version: record.version,
            audit: record.audit,
        })
    }

    pub(crate) fn audit_metadata(&self) -> &AuditMetadata {
        &self.audit
    }

    fn record(&self, version: Version) -> Result<Record> {
        Ok(Record {
            table: self.entity_type.table().to_string(),
            id: self.current.id(),
            version,
            audit: self.audit.clone(),
            columns: self.entity_type.to_columns(&self.current)?,
        })
    }
}

impl<A: Aggregate> TrackedEntry for Entry<A> {
    fn entity_name(&self) -> &'static str {
        self.entity_type.name()
    }

    fn id(&self) -> AggregateId {
        self.current.id()
    }

    fn state(&self) -> EntityState {
        self.state
    }

    fn audit(&self) -> &AuditMetadata {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditMetadata {
        &mut self.audit
    }

    fn event_source(&mut self) -> Option<&mut dyn EventSource> {
        self.current.as_event_source()
    }
}

impl<A: Aggregate> EntryOps for Entry<A> {
    fn detect_changes(&mut self) {
        if !matches!(self.state, EntityState::Unchanged | EntityState::Modified) {
            return;
        }
        if let Some(original) = &self.original {
            self.state = if self.entity_type.has_changes(&self.current, original) {
                EntityState::Modified
            } else {
                EntityState::Unchanged
            };
        }
    }

    fn validate(&self) -> Result<()> {
        match self.state {
            EntityState::Added | EntityState::Modified => {
                self.entity_type.validate(&self.current)
            }
            EntityState::Unchanged | EntityState::Deleted => Ok(()),
        }
    }

    fn to_write(&self) -> Result<Option<RecordWrite>> {
        let write = match self.state {
            EntityState::Added => RecordWrite::Insert(self.record(Version::first())?),
            EntityState::Modified => RecordWrite::Update {
                record: self.record(self.version.next())?,
                expected_version: self.version,
            },
            EntityState::Deleted => RecordWrite::Delete {
                table: self.entity_type.table().to_string(),
                id: self.current.id(),
                expected_version: self.version,
            },
            EntityState::Unchanged => return Ok(None),
        };
        Ok(Some(write))
    }

    fn accept_changes(&mut self) {
        match self.state {
            EntityState::Added | EntityState::Modified => {
                self.version = self.version.next();
                self.original = Some(self.current.clone());
                self.state = EntityState::Unchanged;
            }
            EntityState::Unchanged | EntityState::Deleted => {}
        }
    }

    fn set_audit(&mut self, audit: AuditMetadata) {
        self.audit = audit;
    }

    fn as_tracked_mut(&mut self) -> &mut dyn TrackedEntry {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
