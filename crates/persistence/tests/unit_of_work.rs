//! Unit of work behaviour against the in-memory store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::{Clock, FixedClock, StaticUser};
use persistence::{
    Aggregate, AggregateId, AuditMetadata, ColumnValue, ContextFactory, DomainEvent, DomainEvents,
    EntityConfiguration, EntityState, EntityType, EventSource, HasDomainEvents,
    InMemoryDispatcher, InMemoryStore, JsonConverter, Model, PersistenceError, Property, Record,
    RecordQuery, SaveInterceptor, SavingContext, UnorderedListComparer, Version,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
enum Focus {
    Chest,
    Triceps,
    Legs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum RoutineEvent {
    Created { name: String },
    Renamed { name: String },
}

impl DomainEvent for RoutineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RoutineEvent::Created { .. } => "RoutineCreated",
            RoutineEvent::Renamed { .. } => "RoutineRenamed",
        }
    }
}

#[derive(Debug, Clone)]
struct Routine {
    id: AggregateId,
    name: String,
    focus: Vec<Focus>,
    events: DomainEvents<RoutineEvent>,
}

impl Routine {
    fn create(name: &str, focus: Vec<Focus>) -> Self {
        let mut routine = Self {
            id: AggregateId::new(),
            name: name.to_string(),
            focus,
            events: DomainEvents::new(),
        };
        routine.add_domain_event(RoutineEvent::Created {
            name: name.to_string(),
        });
        routine
    }

    fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.add_domain_event(RoutineEvent::Renamed {
            name: name.to_string(),
        });
    }
}

impl Aggregate for Routine {
    fn aggregate_type() -> &'static str {
        "Routine"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}

impl HasDomainEvents for Routine {
    type Event = RoutineEvent;

    fn add_domain_event(&mut self, event: RoutineEvent) {
        self.events.add(event);
    }

    fn pop_domain_events(&mut self) -> Vec<RoutineEvent> {
        self.events.pop()
    }
}

struct RoutineConfiguration;

impl RoutineConfiguration {
    fn name() -> Property<Routine, String> {
        Property::new("name", |r: &Routine| r.name.clone())
            .required()
            .max_length(20)
    }

    fn focus() -> Property<Routine, Vec<Focus>> {
        Property::converted("focus", |r: &Routine| r.focus.clone(), JsonConverter)
            .with_comparer(UnorderedListComparer)
    }
}

impl EntityConfiguration for RoutineConfiguration {
    type Entity = Routine;

    fn configure() -> EntityType<Routine> {
        EntityType::builder("routines")
            .property(Self::name())
            .property(Self::focus())
            .build(|row| {
                Ok(Routine {
                    id: row.id(),
                    name: row.read(&Self::name())?,
                    focus: row.read(&Self::focus())?,
                    events: DomainEvents::new(),
                })
            })
    }
}

/// An aggregate without the event capability.
#[derive(Debug, Clone)]
struct Coach {
    id: AggregateId,
    name: String,
}

impl Aggregate for Coach {
    fn aggregate_type() -> &'static str {
        "Coach"
    }

    fn id(&self) -> AggregateId {
        self.id
    }
}

struct CoachConfiguration;

impl CoachConfiguration {
    fn name() -> Property<Coach, String> {
        Property::new("name", |c: &Coach| c.name.clone()).required()
    }
}

impl EntityConfiguration for CoachConfiguration {
    type Entity = Coach;

    fn configure() -> EntityType<Coach> {
        EntityType::builder("coaches")
            .property(Self::name())
            .build(|row| {
                Ok(Coach {
                    id: row.id(),
                    name: row.read(&Self::name())?,
                })
            })
    }
}

struct Fixture {
    factory: ContextFactory<InMemoryStore>,
    store: InMemoryStore,
    dispatcher: InMemoryDispatcher,
    clock: Arc<FixedClock>,
}

fn model() -> Model {
    Model::builder()
        .apply::<RoutineConfiguration>()
        .and_then(|b| b.apply::<CoachConfiguration>())
        .unwrap()
        .build()
}

fn fixture() -> Fixture {
    let store = InMemoryStore::new();
    let dispatcher = InMemoryDispatcher::new();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 1, 5, 6, 0, 0).unwrap(),
    ));
    let factory = ContextFactory::builder(store.clone(), model())
        .clock(clock.clone())
        .current_user(Arc::new(StaticUser::new("front-desk")))
        .dispatcher(Arc::new(dispatcher.clone()))
        .build();

    Fixture {
        factory,
        store,
        dispatcher,
        clock,
    }
}

async fn saved_routine(fx: &Fixture, focus: Vec<Focus>) -> AggregateId {
    let routine = Routine::create("Push day", focus);
    let id = routine.id;
    let mut uow = fx.factory.begin();
    uow.set::<Routine>().add(routine).unwrap();
    uow.save().await.unwrap();
    id
}

#[tokio::test]
async fn new_aggregate_is_stamped_and_its_events_dispatched() {
    let fx = fixture();
    let created_at = fx.clock.now();

    let routine = Routine::create("Push day", vec![Focus::Chest, Focus::Triceps]);
    let id = routine.id;

    let mut uow = fx.factory.begin();
    uow.set::<Routine>().add(routine).unwrap();
    let affected = uow.save().await.unwrap();

    assert_eq!(affected, 1);
    let audit = uow.set::<Routine>().audit(id).cloned().unwrap();
    assert_eq!(audit.created_at(), Some(created_at));
    assert_eq!(audit.created_by(), Some("front-desk"));
    assert_eq!(audit.modified_at(), Some(created_at));
    assert_eq!(uow.set::<Routine>().version(id), Some(Version::first()));

    let dispatched = fx.dispatcher.dispatched().await;
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].event_type, "RoutineCreated");
    assert_eq!(dispatched[0].aggregate_id, id);
}

#[tokio::test]
async fn modification_updates_only_modified_columns() {
    let fx = fixture();
    let created_at = fx.clock.now();
    let id = saved_routine(&fx, vec![Focus::Chest]).await;

    fx.clock.advance(Duration::minutes(30));
    let factory = fx
        .factory
        .with_current_user(Arc::new(StaticUser::new("head-coach")));
    let mut uow = factory.begin();
    uow.set::<Routine>()
        .find(id)
        .await
        .unwrap()
        .unwrap()
        .rename("Heavy push day");
    assert_eq!(uow.save().await.unwrap(), 1);

    let mut fresh = fx.factory.begin();
    let mut routines = fresh.set::<Routine>();
    routines.find(id).await.unwrap().unwrap();
    let audit = routines.audit(id).unwrap();
    assert_eq!(audit.created_at(), Some(created_at));
    assert_eq!(audit.created_by(), Some("front-desk"));
    assert_eq!(audit.modified_at(), Some(created_at + Duration::minutes(30)));
    assert_eq!(audit.modified_by(), Some("head-coach"));
    assert_eq!(routines.version(id), Some(Version::new(2)));
}

#[tokio::test]
async fn reordered_list_round_trips_without_a_write() {
    let fx = fixture();
    let id = saved_routine(&fx, vec![Focus::Chest, Focus::Triceps]).await;
    fx.dispatcher.clear().await;

    let mut uow = fx.factory.begin();
    let mut routines = uow.set::<Routine>();
    let routine = routines.find(id).await.unwrap().unwrap();
    assert_eq!(routine.focus, vec![Focus::Chest, Focus::Triceps]);

    routine.focus = vec![Focus::Triceps, Focus::Chest];
    assert_eq!(routines.state(id), Some(EntityState::Unchanged));
    assert!(!uow.has_changes());
    assert_eq!(uow.save().await.unwrap(), 0);

    let mut fresh = fx.factory.begin();
    let mut routines = fresh.set::<Routine>();
    let stored = routines.find(id).await.unwrap().unwrap();
    assert_eq!(stored.focus, vec![Focus::Chest, Focus::Triceps]);
    assert_eq!(routines.version(id), Some(Version::first()));
    assert!(fx.dispatcher.dispatched().await.is_empty());
}

#[tokio::test]
async fn name_over_the_limit_fails_before_the_store() {
    let fx = fixture();
    let mut uow = fx.factory.begin();
    uow.set::<Routine>()
        .add(Routine::create("An extremely long routine name", vec![]))
        .unwrap();

    let err = uow.save().await.unwrap_err();

    assert!(matches!(err, PersistenceError::Validation { entity: "Routine", .. }));
    assert_eq!(fx.store.record_count("routines").await, 0);
    assert!(fx.dispatcher.dispatched().await.is_empty());
}

#[tokio::test]
async fn failed_commit_dispatches_nothing_and_restores_audit() {
    let fx = fixture();
    let routine = Routine::create("Leg day", vec![Focus::Legs]);
    let id = routine.id;

    let mut uow = fx.factory.begin();
    uow.set::<Routine>().add(routine).unwrap();

    fx.store.set_unavailable(true);
    let err = uow.save().await.unwrap_err();

    assert!(err.is_retryable());
    assert!(fx.dispatcher.dispatched().await.is_empty());
    assert_eq!(
        uow.set::<Routine>().audit(id),
        Some(&AuditMetadata::default())
    );
    assert_eq!(uow.set::<Routine>().state(id), Some(EntityState::Added));

    // The events were discarded with the failed save
    fx.store.set_unavailable(false);
    assert_eq!(uow.save().await.unwrap(), 1);
    assert!(fx.dispatcher.dispatched().await.is_empty());
}

#[tokio::test]
async fn retry_in_a_fresh_unit_of_work_dispatches_the_events() {
    let fx = fixture();
    let id = saved_routine(&fx, vec![Focus::Legs]).await;
    fx.dispatcher.clear().await;

    let mut failed = fx.factory.begin();
    failed
        .set::<Routine>()
        .find(id)
        .await
        .unwrap()
        .unwrap()
        .rename("Pull day");
    fx.store.set_unavailable(true);
    assert!(failed.save().await.unwrap_err().is_retryable());
    fx.store.set_unavailable(false);

    let mut retry = fx.factory.begin();
    retry
        .set::<Routine>()
        .find(id)
        .await
        .unwrap()
        .unwrap()
        .rename("Pull day");
    assert_eq!(retry.save().await.unwrap(), 1);

    let dispatched = fx.dispatcher.dispatched().await;
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].event_type, "RoutineRenamed");
}

#[tokio::test]
async fn concurrent_modification_is_a_conflict() {
    let fx = fixture();
    let id = saved_routine(&fx, vec![Focus::Chest]).await;

    let mut first = fx.factory.begin();
    let mut second = fx.factory.begin();
    first
        .set::<Routine>()
        .find(id)
        .await
        .unwrap()
        .unwrap()
        .rename("First");
    second
        .set::<Routine>()
        .find(id)
        .await
        .unwrap()
        .unwrap()
        .rename("Second");

    first.save().await.unwrap();
    let err = second.save().await.unwrap_err();

    assert!(err.is_concurrency_conflict());
    match err {
        PersistenceError::ConcurrencyConflict {
            expected, actual, ..
        } => {
            assert_eq!(expected, Version::first());
            assert_eq!(actual, Some(Version::new(2)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn stored_routine(id: AggregateId, focus: ColumnValue) -> Record {
    let columns: BTreeMap<String, ColumnValue> = [
        ("name".to_string(), ColumnValue::Text("Seeded".into())),
        ("focus".to_string(), focus),
    ]
    .into();
    Record {
        table: "routines".into(),
        id,
        version: Version::first(),
        audit: AuditMetadata::default(),
        columns,
    }
}

#[tokio::test]
async fn malformed_stored_list_fails_loudly() {
    let fx = fixture();
    let id = AggregateId::new();
    fx.store
        .seed(stored_routine(id, ColumnValue::Text("[\"Chest\",".into())))
        .await;

    let mut uow = fx.factory.begin();
    let err = uow.set::<Routine>().find(id).await.unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::Conversion { ref column, .. } if column == "focus"
    ));
}

#[tokio::test]
async fn null_list_reads_as_empty() {
    let fx = fixture();
    let id = AggregateId::new();
    fx.store.seed(stored_routine(id, ColumnValue::Null)).await;

    let mut uow = fx.factory.begin();
    let mut routines = uow.set::<Routine>();
    let routine = routines.find(id).await.unwrap().unwrap();
    assert!(routine.focus.is_empty());
}

#[tokio::test]
async fn removed_aggregate_is_deleted_on_save() {
    let fx = fixture();
    let id = saved_routine(&fx, vec![Focus::Legs]).await;

    let mut uow = fx.factory.begin();
    let mut routines = uow.set::<Routine>();
    routines.find(id).await.unwrap();
    routines.remove(id).unwrap();
    assert!(routines.get(id).is_none());
    assert_eq!(routines.state(id), Some(EntityState::Deleted));

    assert_eq!(uow.save().await.unwrap(), 1);
    assert_eq!(uow.tracked_count(), 0);
    assert_eq!(fx.store.record_count("routines").await, 0);
}

#[tokio::test]
async fn removing_an_unsaved_aggregate_forgets_it() {
    let fx = fixture();
    let routine = Routine::create("Core", vec![]);
    let id = routine.id;

    let mut uow = fx.factory.begin();
    let mut routines = uow.set::<Routine>();
    routines.add(routine).unwrap();
    routines.remove(id).unwrap();

    assert_eq!(routines.count(), 0);
    assert_eq!(uow.save().await.unwrap(), 0);
    assert!(fx.dispatcher.dispatched().await.is_empty());
}

#[tokio::test]
async fn tracking_errors() {
    let fx = fixture();
    let routine = Routine::create("Core", vec![]);
    let id = routine.id;

    let mut uow = fx.factory.begin();
    let mut routines = uow.set::<Routine>();
    routines.add(routine.clone()).unwrap();

    assert!(matches!(
        routines.add(routine),
        Err(PersistenceError::AlreadyTracked { .. })
    ));
    assert!(matches!(
        routines.remove(AggregateId::new()),
        Err(PersistenceError::NotTracked { .. })
    ));
    assert!(routines.get(id).is_some());
}

#[derive(Debug, Clone)]
struct Unmapped(AggregateId);

impl Aggregate for Unmapped {
    fn aggregate_type() -> &'static str {
        "Unmapped"
    }

    fn id(&self) -> AggregateId {
        self.0
    }
}

#[tokio::test]
async fn unconfigured_aggregate_is_rejected() {
    let fx = fixture();
    let mut uow = fx.factory.begin();
    let err = uow
        .set::<Unmapped>()
        .add(Unmapped(AggregateId::new()))
        .unwrap_err();
    assert!(matches!(err, PersistenceError::NotConfigured("Unmapped")));
}

#[tokio::test]
async fn aggregates_without_events_are_saved_and_stamped() {
    let fx = fixture();
    let coach = Coach {
        id: AggregateId::new(),
        name: "Sam".into(),
    };
    let id = coach.id;

    let mut uow = fx.factory.begin();
    uow.set::<Coach>().add(coach).unwrap();
    uow.set::<Routine>()
        .add(Routine::create("Pull day", vec![]))
        .unwrap();

    assert_eq!(uow.save().await.unwrap(), 2);
    assert_eq!(
        uow.set::<Coach>().audit(id).unwrap().created_by(),
        Some("front-desk")
    );
    assert_eq!(fx.dispatcher.dispatched().await.len(), 1);
}

struct RejectEverything;

impl SaveInterceptor for RejectEverything {
    fn name(&self) -> &'static str {
        "reject-everything"
    }

    fn saving_changes(&self, _context: &mut SavingContext<'_>) -> persistence::Result<()> {
        Err(PersistenceError::InvalidConfiguration(
            "saves are disabled".to_string(),
        ))
    }
}

#[tokio::test]
async fn interceptor_failure_aborts_the_save() {
    let store = InMemoryStore::new();
    let dispatcher = InMemoryDispatcher::new();
    let factory = ContextFactory::builder(store.clone(), model())
        .dispatcher(Arc::new(dispatcher.clone()))
        .interceptor(Arc::new(RejectEverything))
        .build();

    let routine = Routine::create("Arms", vec![]);
    let id = routine.id;
    let mut uow = factory.begin();
    uow.set::<Routine>().add(routine).unwrap();

    assert!(uow.save().await.is_err());
    assert_eq!(store.record_count("routines").await, 0);
    assert!(dispatcher.dispatched().await.is_empty());
    assert_eq!(
        uow.set::<Routine>().audit(id).unwrap().created_at(),
        None
    );
}

#[tokio::test]
async fn dispatch_failure_does_not_fail_the_save() {
    let fx = fixture();
    fx.dispatcher.set_failing(true);

    let mut uow = fx.factory.begin();
    uow.set::<Routine>()
        .add(Routine::create("Mobility", vec![]))
        .unwrap();

    assert_eq!(uow.save().await.unwrap(), 1);
    assert_eq!(fx.store.record_count("routines").await, 1);
}

#[tokio::test]
async fn query_filters_by_creator() {
    let fx = fixture();
    saved_routine(&fx, vec![]).await;

    let other = fx
        .factory
        .with_current_user(Arc::new(StaticUser::anonymous()));
    let mut uow = other.begin();
    uow.set::<Routine>()
        .add(Routine::create("Anonymous", vec![]))
        .unwrap();
    uow.save().await.unwrap();

    let mut reader = fx.factory.begin();
    let mut routines = reader.set::<Routine>();
    assert_eq!(routines.load_all().await.unwrap().len(), 2);

    let mine = routines
        .query(&RecordQuery::new().created_by("front-desk"))
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Push day");
}
