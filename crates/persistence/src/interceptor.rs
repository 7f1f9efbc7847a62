//! Pre-commit hooks run by [`UnitOfWork::save`](crate::UnitOfWork::save).

use chrono::{DateTime, Utc};

use crate::envelope::EventEnvelope;
use crate::tracking::{EntityState, EntryOps, TrackedEntry};
use crate::{PersistenceError, Result};

/// State handed to each interceptor while a save is in progress.
pub struct SavingContext<'a> {
    entries: &'a mut [Box<dyn EntryOps>],
    now: DateTime<Utc>,
    actor: Option<String>,
    events: &'a mut Vec<EventEnvelope>,
}

impl<'a> SavingContext<'a> {
    pub(crate) fn new(
        entries: &'a mut [Box<dyn EntryOps>],
        now: DateTime<Utc>,
        actor: Option<String>,
        events: &'a mut Vec<EventEnvelope>,
    ) -> Self {
        Self {
            entries,
            now,
            actor,
            events,
        }
    }

    /// The instant this save started.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// The acting user, if any.
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Every tracked entry, in the order it started being tracked.
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut dyn TrackedEntry> {
        self.entries.iter_mut().map(|entry| entry.as_tracked_mut())
    }

    /// Queues events for dispatch once the commit succeeds.
    pub fn collect_events(&mut self, events: impl IntoIterator<Item = EventEnvelope>) {
        self.events.extend(events);
    }

    pub fn pending_events(&self) -> &[EventEnvelope] {
        self.events
    }
}

/// A hook run synchronously right before the commit.
///
/// Interceptors run in registration order. The first error aborts the save;
/// nothing reaches the store.
pub trait SaveInterceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn saving_changes(&self, context: &mut SavingContext<'_>) -> Result<()>;
}

/// Stamps created/modified columns on inserted and updated rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditInterceptor;

impl SaveInterceptor for AuditInterceptor {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn saving_changes(&self, context: &mut SavingContext<'_>) -> Result<()> {
        let now = context.now();
        let actor = context.actor().map(str::to_string);

        for entry in context.entries_mut() {
            match entry.state() {
                EntityState::Added => entry.audit_mut().stamp_created(now, actor.clone()),
                EntityState::Modified => entry.audit_mut().stamp_modified(now, actor.clone()),
                EntityState::Unchanged | EntityState::Deleted => {}
            }
        }
        Ok(())
    }
}

/// Drains domain events from every tracked aggregate that raises them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainEventInterceptor;

impl SaveInterceptor for DomainEventInterceptor {
    fn name(&self) -> &'static str {
        "domain-events"
    }

    fn saving_changes(&self, context: &mut SavingContext<'_>) -> Result<()> {
        let now = context.now();
        let mut harvested = Vec::new();

        for entry in context.entries_mut() {
            if let Some(source) = entry.event_source() {
                harvested.extend(source.drain_envelopes(now).map_err(PersistenceError::from)?);
            }
        }

        tracing::debug!(count = harvested.len(), "harvested domain events");
        context.collect_events(harvested);
        Ok(())
    }
}

/// The pipeline every unit of work uses unless configured otherwise.
pub fn default_interceptors() -> Vec<std::sync::Arc<dyn SaveInterceptor>> {
    vec![
        std::sync::Arc::new(AuditInterceptor),
        std::sync::Arc::new(DomainEventInterceptor),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use serde::Serialize;

    use super::*;
    use crate::AggregateId;
    use crate::aggregate::{Aggregate, DomainEvent, DomainEvents, EventSource, HasDomainEvents};
    use crate::entity::EntityType;
    use crate::mapping::Property;
    use crate::tracking::Entry;

    #[derive(Debug, Clone, Serialize)]
    struct Logged {
        minutes: u32,
    }

    impl DomainEvent for Logged {
        fn event_type(&self) -> &'static str {
            "SessionLogged"
        }
    }

    #[derive(Debug, Clone)]
    struct Session {
        id: AggregateId,
        minutes: u32,
        events: DomainEvents<Logged>,
    }

    impl Session {
        fn log(minutes: u32) -> Self {
            let mut session = Self {
                id: AggregateId::new(),
                minutes,
                events: DomainEvents::new(),
            };
            session.add_domain_event(Logged { minutes });
            session
        }
    }

    impl Aggregate for Session {
        fn aggregate_type() -> &'static str {
            "Session"
        }

        fn id(&self) -> AggregateId {
            self.id
        }

        fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
            Some(self)
        }
    }

    impl HasDomainEvents for Session {
        type Event = Logged;

        fn add_domain_event(&mut self, event: Logged) {
            self.events.add(event);
        }

        fn pop_domain_events(&mut self) -> Vec<Logged> {
            self.events.pop()
        }
    }

    fn minutes() -> Property<Session, u32> {
        Property::new("minutes", |s: &Session| s.minutes)
    }

    fn entries(sessions: Vec<Session>) -> Vec<Box<dyn EntryOps>> {
        let entity_type = Arc::new(EntityType::builder("sessions").property(minutes()).build(
            |row| {
                Ok(Session {
                    id: row.id(),
                    minutes: row.read(&minutes())?,
                    events: DomainEvents::new(),
                })
            },
        ));
        sessions
            .into_iter()
            .map(|s| Box::new(Entry::added(entity_type.clone(), s)) as Box<dyn EntryOps>)
            .collect()
    }

    #[test]
    fn audit_stamps_added_entries() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap();
        let mut entries = entries(vec![Session::log(45)]);
        let mut events = Vec::new();
        let mut context =
            SavingContext::new(&mut entries, now, Some("coach-7".into()), &mut events);

        AuditInterceptor.saving_changes(&mut context).unwrap();

        let audit = entries[0].audit();
        assert_eq!(audit.created_at(), Some(now));
        assert_eq!(audit.created_by(), Some("coach-7"));
        assert_eq!(audit.modified_at(), Some(now));
    }

    #[test]
    fn events_are_drained_in_tracking_order() {
        let now = Utc::now();
        let first = Session::log(20);
        let second = Session::log(60);
        let expected = vec![first.id, second.id];

        let mut entries = entries(vec![first, second]);
        let mut events = Vec::new();
        let mut context = SavingContext::new(&mut entries, now, None, &mut events);

        DomainEventInterceptor.saving_changes(&mut context).unwrap();
        assert_eq!(context.pending_events().len(), 2);

        // A second pass finds nothing left to drain
        DomainEventInterceptor.saving_changes(&mut context).unwrap();
        assert_eq!(context.pending_events().len(), 2);

        let ids: Vec<_> = events.iter().map(|e| e.aggregate_id).collect();
        assert_eq!(ids, expected);
        assert!(events.iter().all(|e| e.event_type == "SessionLogged"));
    }
}
