//! Post-commit delivery of harvested domain events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::envelope::EventEnvelope;

/// Failure to deliver an event. Never rolls back the save that raised it.
#[derive(Debug, Error)]
#[error("failed to dispatch {event_type}: {reason}")]
pub struct DispatchError {
    pub event_type: String,
    pub reason: String,
}

impl DispatchError {
    pub fn new(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            reason: reason.into(),
        }
    }
}

/// Receives domain events after the transaction that raised them committed.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: &EventEnvelope) -> Result<(), DispatchError>;
}

/// Logs every event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

#[async_trait]
impl EventDispatcher for TracingDispatcher {
    async fn dispatch(&self, event: &EventEnvelope) -> Result<(), DispatchError> {
        tracing::info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            "domain event"
        );
        Ok(())
    }
}

/// Records dispatched events in memory.
#[derive(Clone, Default)]
pub struct InMemoryDispatcher {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in dispatch order.
    pub async fn dispatched(&self) -> Vec<EventEnvelope> {
        self.events.read().await.clone()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }

    /// Makes every subsequent dispatch fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventDispatcher for InMemoryDispatcher {
    async fn dispatch(&self, event: &EventEnvelope) -> Result<(), DispatchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DispatchError::new(
                event.event_type.clone(),
                "dispatcher is marked as failing",
            ));
        }
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

/// Delivers each event to several dispatchers in order.
///
/// Every dispatcher sees the event even if an earlier one fails; the first
/// error is reported.
#[derive(Clone, Default)]
pub struct FanOutDispatcher {
    targets: Vec<Arc<dyn EventDispatcher>>,
}

impl FanOutDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.targets.push(dispatcher);
        self
    }
}

#[async_trait]
impl EventDispatcher for FanOutDispatcher {
    async fn dispatch(&self, event: &EventEnvelope) -> Result<(), DispatchError> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(e) = target.dispatch(event).await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Dispatches a committed batch. Failures are logged and counted only.
pub(crate) async fn dispatch_all(dispatcher: &dyn EventDispatcher, events: Vec<EventEnvelope>) {
    for event in &events {
        match dispatcher.dispatch(event).await {
            Ok(()) => {
                metrics::counter!("domain_events_dispatched_total").increment(1);
            }
            Err(e) => {
                metrics::counter!("domain_event_dispatch_failures_total").increment(1);
                tracing::warn!(
                    event_id = %event.event_id,
                    error = %e,
                    "domain event dispatch failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde::Serialize;

    use super::*;
    use crate::AggregateId;
    use crate::aggregate::DomainEvent;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged;

    impl DomainEvent for Pinged {
        fn event_type(&self) -> &'static str {
            "Pinged"
        }
    }

    fn envelope() -> EventEnvelope {
        EventEnvelope::from_event(&Pinged, AggregateId::new(), "Probe", Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn in_memory_dispatcher_records_events() {
        let dispatcher = InMemoryDispatcher::new();
        let event = envelope();

        dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(dispatcher.dispatched().await, vec![event]);
    }

    #[tokio::test]
    async fn fan_out_reaches_every_target() {
        let healthy = InMemoryDispatcher::new();
        let broken = InMemoryDispatcher::new();
        broken.set_failing(true);

        let fan_out = FanOutDispatcher::new()
            .with(Arc::new(broken.clone()))
            .with(Arc::new(healthy.clone()));

        let result = fan_out.dispatch(&envelope()).await;

        assert!(result.is_err());
        assert_eq!(healthy.dispatched().await.len(), 1);
        assert!(broken.dispatched().await.is_empty());
    }

    #[tokio::test]
    async fn dispatch_failures_do_not_stop_the_batch() {
        let dispatcher = InMemoryDispatcher::new();
        dispatcher.set_failing(true);

        dispatch_all(&dispatcher, vec![envelope(), envelope()]).await;

        dispatcher.set_failing(false);
        dispatch_all(&dispatcher, vec![envelope()]).await;
        assert_eq!(dispatcher.dispatched().await.len(), 1);
    }
}
