//! Client domain events.

use common::AggregateId;
use persistence::DomainEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEvent {
    ClientRegistered(ClientRegisteredData),
    ClientAssignedToTrainer(ClientAssignedToTrainerData),
}

impl DomainEvent for ClientEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::ClientRegistered(_) => "ClientRegistered",
            ClientEvent::ClientAssignedToTrainer(_) => "ClientAssignedToTrainer",
        }
    }
}

/// Data for ClientRegistered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRegisteredData {
    pub client_id: AggregateId,
    pub email: String,
}

/// Data for ClientAssignedToTrainer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAssignedToTrainerData {
    pub client_id: AggregateId,
    pub trainer_id: AggregateId,

    /// Trainer the client had before, if any.
    pub previous_trainer_id: Option<AggregateId>,
}
