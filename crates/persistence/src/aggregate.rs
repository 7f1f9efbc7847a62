//! Aggregate root capability and the domain event carrier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AggregateId;
use crate::envelope::EventEnvelope;

/// Trait for domain events.
///
/// Domain events are immutable facts raised by aggregate behaviour.
/// They should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone + 'static {
    /// Returns the event type name used when dispatching.
    fn event_type(&self) -> &'static str;
}

/// Queue of domain events raised by an aggregate and not yet harvested.
///
/// The queue can only be appended to or drained; there is no way to peek.
/// Cloning yields an empty queue so a copied aggregate can never hand out
/// the same events twice.
pub struct DomainEvents<E> {
    pending: Vec<E>,
}

impl<E> DomainEvents<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Appends an event, preserving insertion order.
    pub fn add(&mut self, event: E) {
        self.pending.push(event);
    }

    /// Returns every pending event in insertion order and empties the queue.
    pub fn pop(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending)
    }
}

impl<E> Default for DomainEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for DomainEvents<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainEvents")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<E> Clone for DomainEvents<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Capability of aggregates that raise domain events.
pub trait HasDomainEvents {
    type Event: DomainEvent;

    fn add_domain_event(&mut self, event: Self::Event);

    /// Drains the pending events. A second call returns an empty list.
    fn pop_domain_events(&mut self) -> Vec<Self::Event>;
}

/// An aggregate root that can be tracked by a unit of work.
pub trait Aggregate: Clone + Send + Sync + 'static {
    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    fn id(&self) -> AggregateId;

    /// Exposes the event capability, if this aggregate has it.
    ///
    /// Aggregates implementing [`HasDomainEvents`] return `Some(self)`.
    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        None
    }
}

/// Type-erased view of [`HasDomainEvents`] used by the save pipeline.
pub trait EventSource {
    /// Drains pending events and wraps each in an [`EventEnvelope`].
    fn drain_envelopes(
        &mut self,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>, serde_json::Error>;
}

impl<A> EventSource for A
where
    A: Aggregate + HasDomainEvents,
{
    fn drain_envelopes(
        &mut self,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<EventEnvelope>, serde_json::Error> {
        let aggregate_id = self.id();
        self.pop_domain_events()
            .iter()
            .map(|event| {
                EventEnvelope::from_event(event, aggregate_id, A::aggregate_type(), occurred_at)
            })
            .collect()
    }
}
