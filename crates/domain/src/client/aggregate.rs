//! Client aggregate implementation.

use common::AggregateId;
use persistence::{Aggregate, DomainEvents, EventSource, HasDomainEvents};

use super::{ClientAssignedToTrainerData, ClientError, ClientEvent, ClientRegisteredData};
use crate::email::looks_like_email;

/// A gym member, optionally coached by a trainer.
#[derive(Debug, Clone)]
pub struct Client {
    id: AggregateId,
    first_name: String,
    last_name: String,
    email: String,
    trainer_id: Option<AggregateId>,
    events: DomainEvents<ClientEvent>,
}

impl Client {
    /// Registers a new client and raises `ClientRegistered`.
    pub fn register(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let email = email.into();
        if !looks_like_email(&email) {
            return Err(ClientError::InvalidEmail(email));
        }

        let mut client = Self::restore(
            AggregateId::new(),
            first_name.into(),
            last_name.into(),
            email,
            None,
        );
        client.add_domain_event(ClientEvent::ClientRegistered(ClientRegisteredData {
            client_id: client.id,
            email: client.email.clone(),
        }));
        Ok(client)
    }

    /// Rebuilds a client from stored state. Raises no events.
    pub fn restore(
        id: AggregateId,
        first_name: String,
        last_name: String,
        email: String,
        trainer_id: Option<AggregateId>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            trainer_id,
            events: DomainEvents::new(),
        }
    }

    // Query methods

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn trainer_id(&self) -> Option<AggregateId> {
        self.trainer_id
    }

    // Command methods

    /// Assigns the client to a trainer. Re-assigning the same trainer is a no-op.
    pub fn assign_trainer(&mut self, trainer_id: AggregateId) {
        if self.trainer_id == Some(trainer_id) {
            return;
        }

        let previous_trainer_id = self.trainer_id.replace(trainer_id);
        self.add_domain_event(ClientEvent::ClientAssignedToTrainer(
            ClientAssignedToTrainerData {
                client_id: self.id,
                trainer_id,
                previous_trainer_id,
            },
        ));
    }
}

impl HasDomainEvents for Client {
    type Event = ClientEvent;

    fn add_domain_event(&mut self, event: ClientEvent) {
        self.events.add(event);
    }

    fn pop_domain_events(&mut self) -> Vec<ClientEvent> {
        self.events.pop()
    }
}

impl Aggregate for Client {
    fn aggregate_type() -> &'static str {
        "Client"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}
