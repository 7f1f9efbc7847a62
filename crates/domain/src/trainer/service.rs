//! Trainer service.

use std::sync::Arc;

use common::{AggregateId, CurrentUser};
use persistence::{Aggregate, ContextFactory, RecordQuery, RecordStore};

use crate::error::DomainError;
use crate::persisted::{self, Persisted, require};

use super::Trainer;

/// Service for registering and looking up trainers.
pub struct TrainerService<S> {
    factory: ContextFactory<S>,
}

impl<S> Clone for TrainerService<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<S: RecordStore> TrainerService<S> {
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
    ) -> Result<Persisted<Trainer>, DomainError> {
        let trainer = Trainer::register(first_name, last_name, email)?;
        let id = trainer.id();

        let mut uow = self.factory.begin();
        uow.set::<Trainer>().add(trainer)?;
        uow.save().await?;

        tracing::info!(trainer_id = %id, "Trainer registered");
        Persisted::capture(&mut uow, id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: AggregateId) -> Result<Option<Persisted<Trainer>>, DomainError> {
        persisted::fetch(&self.factory, id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: RecordQuery) -> Result<Vec<Persisted<Trainer>>, DomainError> {
        persisted::list(&self.factory, &query).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn change_email(
        &self,
        id: AggregateId,
        email: String,
    ) -> Result<Persisted<Trainer>, DomainError> {
        let mut uow = self.factory.begin();
        let mut trainers = uow.set::<Trainer>();
        require(&mut trainers, id).await?.change_email(email)?;

        uow.save().await?;
        Persisted::capture(&mut uow, id)
    }
}
