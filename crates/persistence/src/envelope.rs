use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::AggregateId;
use crate::aggregate::DomainEvent;

/// Unique identifier for a harvested domain event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row version used for optimistic concurrency control.
///
/// A row that has never been written is at version 0; the first insert
/// writes version 1 and every update bumps it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Version of an aggregate that has not been persisted yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version written by the first insert.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A domain event drained from an aggregate, ready for post-commit dispatch.
///
/// The payload is the serialized event so dispatchers do not need to know
/// every aggregate's event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// The event name, e.g. "ExerciseCreated".
    pub event_type: String,

    pub aggregate_id: AggregateId,

    /// The aggregate name, e.g. "Exercise".
    pub aggregate_type: String,

    /// When the save that harvested the event started.
    pub occurred_at: DateTime<Utc>,

    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Wraps a domain event raised by `aggregate_id`.
    pub fn from_event<E: DomainEvent>(
        event: &E,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: EventId::new(),
            event_type: event.event_type().to_string(),
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            occurred_at,
            payload: serde_json::to_value(event)?,
        })
    }

    /// Deserializes the payload back into a concrete event type.
    pub fn decode<E: DeserializeOwned>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
