//! Hero domain events.

use common::AggregateId;
use persistence::DomainEvent;
use serde::{Deserialize, Serialize};

use super::Power;

/// Events raised by the hero aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HeroEvent {
    HeroCreated(HeroCreatedData),
    PowerAdded(PowerAddedData),
}

impl DomainEvent for HeroEvent {
    fn event_type(&self) -> &'static str {
        match self {
            HeroEvent::HeroCreated(_) => "HeroCreated",
            HeroEvent::PowerAdded(_) => "PowerAdded",
        }
    }
}

/// Data for HeroCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroCreatedData {
    pub hero_id: AggregateId,
    pub name: String,
    pub alias: String,
}

/// Data for PowerAdded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerAddedData {
    pub hero_id: AggregateId,
    pub power: Power,

    /// Hero's total power level after the addition.
    pub power_level: i64,
}
