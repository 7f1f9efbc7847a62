//! Hero service.

use std::sync::Arc;

use common::{AggregateId, CurrentUser};
use persistence::{Aggregate, ContextFactory, RecordQuery, RecordStore};

use crate::error::DomainError;
use crate::persisted::{self, Persisted, require};

use super::{Hero, Power};

/// Service for managing heroes.
pub struct HeroService<S> {
    factory: ContextFactory<S>,
}

impl<S> Clone for HeroService<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<S: RecordStore> HeroService<S> {
    /// Creates a new hero service over the given context factory.
    pub fn new(factory: ContextFactory<S>) -> Self {
        Self { factory }
    }

    pub fn acting_as(&self, user: Arc<dyn CurrentUser>) -> Self {
        Self::new(self.factory.with_current_user(user))
    }

    /// Creates a hero with no powers.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, name: String, alias: String) -> Result<Persisted<Hero>, DomainError> {
        let hero = Hero::create(name, alias);
        let id = hero.id();

        let mut uow = self.factory.begin();
        uow.set::<Hero>().add(hero)?;
        uow.save().await?;
        Persisted::capture(&mut uow, id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: AggregateId) -> Result<Option<Persisted<Hero>>, DomainError> {
        persisted::fetch(&self.factory, id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: RecordQuery) -> Result<Vec<Persisted<Hero>>, DomainError> {
        persisted::list(&self.factory, &query).await
    }

    /// Grants a power to an existing hero.
    #[tracing::instrument(skip(self))]
    pub async fn add_power(
        &self,
        id: AggregateId,
        power: Power,
    ) -> Result<Persisted<Hero>, DomainError> {
        let mut uow = self.factory.begin();
        let mut heroes = uow.set::<Hero>();
        require(&mut heroes, id).await?.add_power(power)?;

        uow.save().await?;
        Persisted::capture(&mut uow, id)
    }
}
