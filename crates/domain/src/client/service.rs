//! Client service.

use std::sync::Arc;

use common::{AggregateId, CurrentUser};
use persistence::{Aggregate, ContextFactory, RecordQuery, RecordStore};

use crate::error::DomainError;
use crate::persisted::{self, Persisted, require};
use crate::trainer::Trainer;

use super::Client;

/// Service for registering clients and pairing them with trainers.
pub struct ClientService<S> {
    factory: ContextFactory<S>,
}

impl<S> Clone for ClientService<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<S: RecordStore> ClientService<S> {
    pub fn new(factory: ContextFactory<S>) -> Self {
        Self { factory }
    }

    pub fn acting_as(&self, user: Arc<dyn CurrentUser>) -> Self {
        Self::new(self.factory.with_current_user(user))
    }

    #[tracing::instrument(skip(self))]
    pub async fn register(
        &self,
        first_name: String,
        last_name: String,
        email: String,
    ) -> Result<Persisted<Client>, DomainError> {
        let client = Client::register(first_name, last_name, email)?;
        let id = client.id();

        let mut uow = self.factory.begin();
        uow.set::<Client>().add(client)?;
        uow.save().await?;
        Persisted::capture(&mut uow, id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: AggregateId) -> Result<Option<Persisted<Client>>, DomainError> {
        persisted::fetch(&self.factory, id).await
    }

    /// Clients coached by `trainer_id`.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_trainer(
        &self,
        trainer_id: AggregateId,
    ) -> Result<Vec<Persisted<Client>>, DomainError> {
        let clients = persisted::list::<Client, S>(&self.factory, &RecordQuery::new()).await?;
        Ok(clients
            .into_iter()
            .filter(|c| c.aggregate.trainer_id() == Some(trainer_id))
            .collect())
    }

    /// Pairs a client with an existing trainer.
    #[tracing::instrument(skip(self))]
    pub async fn assign_trainer(
        &self,
        client_id: AggregateId,
        trainer_id: AggregateId,
    ) -> Result<Persisted<Client>, DomainError> {
        let mut uow = self.factory.begin();
        require(&mut uow.set::<Trainer>(), trainer_id).await?;

        let mut clients = uow.set::<Client>();
        require(&mut clients, client_id)
            .await?
            .assign_trainer(trainer_id);

        uow.save().await?;
        Persisted::capture(&mut uow, client_id)
    }
}
