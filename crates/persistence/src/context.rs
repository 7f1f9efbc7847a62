//! The unit of work and the factory that opens one per request.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use common::{Anonymous, Clock, CurrentUser, SystemClock};

use crate::aggregate::Aggregate;
use crate::dispatch::{EventDispatcher, TracingDispatcher, dispatch_all};
use crate::entity::EntityType;
use crate::interceptor::{SaveInterceptor, SavingContext, default_interceptors};
use crate::model::Model;
use crate::query::RecordQuery;
use crate::record::{AuditMetadata, ChangeSet, Record};
use crate::store::RecordStore;
use crate::tracking::{EntityState, Entry, EntryOps};
use crate::{AggregateId, PersistenceError, Result, Version};

struct ContextServices<S> {
    model: Arc<Model>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn EventDispatcher>,
    interceptors: Vec<Arc<dyn SaveInterceptor>>,
}

/// Shared collaborators of every unit of work, built once at startup.
pub struct ContextFactory<S> {
    services: Arc<ContextServices<S>>,
    current_user: Arc<dyn CurrentUser>,
}

impl<S> Clone for ContextFactory<S> {
    fn clone(&self) -> Self {
        Self {
            services: self.services.clone(),
            current_user: self.current_user.clone(),
        }
    }
}

impl<S: RecordStore> ContextFactory<S> {
    pub fn builder(store: S, model: Model) -> ContextFactoryBuilder<S> {
        ContextFactoryBuilder {
            model,
            store,
            clock: Arc::new(SystemClock),
            current_user: Arc::new(Anonymous),
            dispatcher: Arc::new(TracingDispatcher),
            interceptors: default_interceptors(),
        }
    }

    /// A factory whose units of work act as `user`.
    pub fn with_current_user(&self, user: Arc<dyn CurrentUser>) -> Self {
        Self {
            services: self.services.clone(),
            current_user: user,
        }
    }

    /// Opens a fresh unit of work with nothing tracked.
    pub fn begin(&self) -> UnitOfWork<S> {
        UnitOfWork {
            factory: self.clone(),
            entries: Vec::new(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.services.model
    }

    pub fn store(&self) -> &S {
        &self.services.store
    }
}

/// Builder returned by [`ContextFactory::builder`].
pub struct ContextFactoryBuilder<S> {
    model: Model,
    store: S,
    clock: Arc<dyn Clock>,
    current_user: Arc<dyn CurrentUser>,
    dispatcher: Arc<dyn EventDispatcher>,
    interceptors: Vec<Arc<dyn SaveInterceptor>>,
}

impl<S: RecordStore> ContextFactoryBuilder<S> {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn current_user(mut self, user: Arc<dyn CurrentUser>) -> Self {
        self.current_user = user;
        self
    }

    pub fn dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Appends an interceptor after the ones already registered.
    pub fn interceptor(mut self, interceptor: Arc<dyn SaveInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Replaces the whole interceptor pipeline.
    pub fn interceptors(mut self, interceptors: Vec<Arc<dyn SaveInterceptor>>) -> Self {
        self.interceptors = interceptors;
        self
    }

    pub fn build(self) -> ContextFactory<S> {
        ContextFactory {
            services: Arc::new(ContextServices {
                model: Arc::new(self.model),
                store: Arc::new(self.store),
                clock: self.clock,
                dispatcher: self.dispatcher,
                interceptors: self.interceptors,
            }),
            current_user: self.current_user,
        }
    }
}

/// Tracks aggregates for one request and commits them together.
pub struct UnitOfWork<S> {
    factory: ContextFactory<S>,
    entries: Vec<Box<dyn EntryOps>>,
}

impl<S: RecordStore> UnitOfWork<S> {
    /// The collection of tracked `A` aggregates.
    pub fn set<A: Aggregate>(&mut self) -> AggregateSet<'_, A, S> {
        AggregateSet {
            uow: self,
            _aggregate: PhantomData,
        }
    }

    /// True when the next save would write something.
    pub fn has_changes(&mut self) -> bool {
        self.entries.iter_mut().any(|entry| {
            entry.detect_changes();
            entry.state().is_pending()
        })
    }

    /// Number of tracked aggregates of every type.
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }

    /// Stops tracking everything without saving.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Commits every tracked change atomically.
    ///
    /// Runs change detection and validation, then the interceptor pipeline,
    /// then the store commit. Harvested domain events are dispatched only
    /// after the commit succeeded; when any step fails they are dropped and
    /// audit columns are put back as they were. Returns the number of rows
    /// written.
    ///
    /// Dropped events are not put back on their aggregates. Calling `save`
    /// again on this unit of work after a retryable error commits the rows
    /// but dispatches nothing; retry by opening a new unit of work and
    /// replaying the operation on freshly loaded aggregates.
    #[tracing::instrument(skip(self), fields(tracked = self.entries.len()))]
    pub async fn save(&mut self) -> Result<usize> {
        let started = Instant::now();

        for entry in &mut self.entries {
            entry.detect_changes();
        }
        if let Err(e) = self.entries.iter().try_for_each(|entry| entry.validate()) {
            return Err(self.fail(e, 0));
        }

        let services = self.factory.services.clone();
        let now = services.clock.now();
        let actor = self.factory.current_user.user_id();
        let audits: Vec<AuditMetadata> = self.entries.iter().map(|e| e.audit().clone()).collect();

        let mut events = Vec::new();
        let prepared = self.prepare(&services.interceptors, now, actor, &mut events);
        let changes = match prepared {
            Ok(changes) => changes,
            Err(e) => {
                self.restore_audits(audits);
                return Err(self.fail(e, events.len()));
            }
        };

        let affected = if changes.is_empty() {
            0
        } else {
            match services.store.commit(changes).await {
                Ok(affected) => affected,
                Err(e) => {
                    self.restore_audits(audits);
                    return Err(self.fail(e, events.len()));
                }
            }
        };

        self.entries
            .retain(|entry| entry.state() != EntityState::Deleted);
        for entry in &mut self.entries {
            entry.accept_changes();
        }

        metrics::counter!("persistence_saves_total").increment(1);
        metrics::histogram!("persistence_save_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(affected, events = events.len(), "changes saved");

        dispatch_all(services.dispatcher.as_ref(), events).await;
        Ok(affected)
    }

    fn prepare(
        &mut self,
        interceptors: &[Arc<dyn SaveInterceptor>],
        now: chrono::DateTime<chrono::Utc>,
        actor: Option<String>,
        events: &mut Vec<crate::EventEnvelope>,
    ) -> Result<ChangeSet> {
        let mut context = SavingContext::new(&mut self.entries, now, actor, events);
        for interceptor in interceptors {
            interceptor.saving_changes(&mut context).inspect_err(|e| {
                tracing::warn!(interceptor = interceptor.name(), error = %e, "interceptor failed");
            })?;
        }

        self.entries
            .iter()
            .filter_map(|entry| entry.to_write().transpose())
            .collect()
    }

    fn restore_audits(&mut self, audits: Vec<AuditMetadata>) {
        for (entry, audit) in self.entries.iter_mut().zip(audits) {
            entry.set_audit(audit);
        }
    }

    fn fail(&self, error: PersistenceError, discarded_events: usize) -> PersistenceError {
        metrics::counter!("persistence_save_failures_total").increment(1);
        tracing::warn!(error = %error, discarded_events, "save failed");
        error
    }

    fn position<A: Aggregate>(&self, id: AggregateId) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.as_any().is::<Entry<A>>() && entry.id() == id
        })
    }

    fn entry<A: Aggregate>(&self, index: usize) -> Option<&Entry<A>> {
        self.entries.get(index)?.as_any().downcast_ref::<Entry<A>>()
    }

    fn entry_mut<A: Aggregate>(&mut self, index: usize) -> Option<&mut Entry<A>> {
        self.entries
            .get_mut(index)?
            .as_any_mut()
            .downcast_mut::<Entry<A>>()
    }

    /// Tracks a loaded row unless the aggregate is already tracked, and
    /// returns its position.
    fn attach<A: Aggregate>(
        &mut self,
        entity_type: &Arc<EntityType<A>>,
        record: Record,
    ) -> Result<usize> {
        if let Some(index) = self.position::<A>(record.id) {
            return Ok(index);
        }
        self.entries
            .push(Box::new(Entry::loaded(entity_type.clone(), record)?));
        Ok(self.entries.len() - 1)
    }
}

/// Typed view over the `A` aggregates of one unit of work.
pub struct AggregateSet<'a, A, S> {
    uow: &'a mut UnitOfWork<S>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<'a, A: Aggregate, S: RecordStore> AggregateSet<'a, A, S> {
    fn entity_type(&self) -> Result<Arc<EntityType<A>>> {
        self.uow.factory.model().entity_type::<A>()
    }

    /// Starts tracking a new aggregate; it is inserted on the next save.
    pub fn add(&mut self, aggregate: A) -> Result<()> {
        let entity_type = self.entity_type()?;
        let id = aggregate.id();
        if self.uow.position::<A>(id).is_some() {
            return Err(PersistenceError::AlreadyTracked {
                entity: entity_type.name(),
                id,
            });
        }
        self.uow
            .entries
            .push(Box::new(Entry::added(entity_type, aggregate)));
        Ok(())
    }

    /// Returns the tracked aggregate, loading it from the store if needed.
    ///
    /// An aggregate marked for removal is reported as absent.
    pub async fn find(&mut self, id: AggregateId) -> Result<Option<&mut A>> {
        let entity_type = self.entity_type()?;

        let index = match self.uow.position::<A>(id) {
            Some(index) => index,
            None => {
                let schema = entity_type.schema();
                match self.uow.factory.store().fetch(&schema, id).await? {
                    Some(record) => self.uow.attach(&entity_type, record)?,
                    None => return Ok(None),
                }
            }
        };

        Ok(self
            .uow
            .entry_mut::<A>(index)
            .filter(|entry| entry.state != EntityState::Deleted)
            .map(|entry| &mut entry.current))
    }

    /// A tracked aggregate, without touching the store.
    pub fn get(&self, id: AggregateId) -> Option<&A> {
        let index = self.uow.position::<A>(id)?;
        self.uow
            .entry::<A>(index)
            .filter(|entry| entry.state != EntityState::Deleted)
            .map(|entry| &entry.current)
    }

    pub fn get_mut(&mut self, id: AggregateId) -> Option<&mut A> {
        let index = self.uow.position::<A>(id)?;
        self.uow
            .entry_mut::<A>(index)
            .filter(|entry| entry.state != EntityState::Deleted)
            .map(|entry| &mut entry.current)
    }

    /// Marks a tracked aggregate for deletion.
    ///
    /// An aggregate added in this unit of work is simply forgotten.
    pub fn remove(&mut self, id: AggregateId) -> Result<()> {
        let Some(index) = self.uow.position::<A>(id) else {
            return Err(PersistenceError::NotTracked {
                entity: A::aggregate_type(),
                id,
            });
        };

        let state = self.uow.entries[index].state();
        match state {
            EntityState::Added => {
                self.uow.entries.remove(index);
            }
            _ => {
                if let Some(entry) = self.uow.entry_mut::<A>(index) {
                    entry.state = EntityState::Deleted;
                }
            }
        }
        Ok(())
    }

    /// Loads every stored `A`, tracking rows not tracked yet.
    ///
    /// Already tracked aggregates keep their in-memory state. Aggregates
    /// added but not saved yet are not included.
    pub async fn load_all(&mut self) -> Result<Vec<&A>> {
        let entity_type = self.entity_type()?;
        let records = self
            .uow
            .factory
            .store()
            .fetch_all(&entity_type.schema())
            .await?;
        self.track_all(&entity_type, records)
    }

    /// Loads the stored `A` rows matching `query`.
    pub async fn query(&mut self, query: &RecordQuery) -> Result<Vec<&A>> {
        let entity_type = self.entity_type()?;
        let records = self
            .uow
            .factory
            .store()
            .query(&entity_type.schema(), query)
            .await?;
        self.track_all(&entity_type, records)
    }

    fn track_all(
        &mut self,
        entity_type: &Arc<EntityType<A>>,
        records: Vec<Record>,
    ) -> Result<Vec<&A>> {
        let mut indexes = Vec::with_capacity(records.len());
        for record in records {
            indexes.push(self.uow.attach(entity_type, record)?);
        }

        let uow: &UnitOfWork<S> = self.uow;
        Ok(indexes
            .into_iter()
            .filter_map(|index| uow.entry::<A>(index))
            .filter(|entry| entry.state != EntityState::Deleted)
            .map(|entry| &entry.current)
            .collect())
    }

    /// Audit columns of a tracked aggregate as of its last load or save.
    pub fn audit(&self, id: AggregateId) -> Option<&AuditMetadata> {
        let index = self.uow.position::<A>(id)?;
        self.uow.entry::<A>(index).map(Entry::audit_metadata)
    }

    pub fn state(&mut self, id: AggregateId) -> Option<EntityState> {
        let index = self.uow.position::<A>(id)?;
        let entry = &mut self.uow.entries[index];
        entry.detect_changes();
        Some(entry.state())
    }

    /// Stored version of a tracked aggregate; 0 until first saved.
    pub fn version(&self, id: AggregateId) -> Option<Version> {
        let index = self.uow.position::<A>(id)?;
        self.uow.entry::<A>(index).map(|entry| entry.version)
    }

    /// Number of tracked `A` aggregates not marked for removal.
    pub fn count(&self) -> usize {
        self.uow
            .entries
            .iter()
            .filter(|entry| entry.as_any().is::<Entry<A>>())
            .filter(|entry| entry.state() != EntityState::Deleted)
            .count()
    }
}

impl<S> std::fmt::Debug for UnitOfWork<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut states: HashMap<&'static str, usize> = HashMap::new();
        for entry in &self.entries {
            *states.entry(entry.entity_name()).or_default() += 1;
        }
        f.debug_struct("UnitOfWork")
            .field("tracked", &states)
            .finish()
    }
}
