//! Team service.

use std::sync::Arc;

use common::{AggregateId, CurrentUser};
use persistence::{Aggregate, ContextFactory, RecordStore};

use crate::error::DomainError;
use crate::hero::Hero;
use crate::persisted::{self, Persisted, require};

use super::Team;

/// Service for forming teams and running their missions.
pub struct TeamService<S> {
    factory: ContextFactory<S>,
}

impl<S> Clone for TeamService<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<S: RecordStore> TeamService<S> {
    pub fn new(factory: ContextFactory<S>) -> Self {
        Self { factory }
    }

    pub fn acting_as(&self, user: Arc<dyn CurrentUser>) -> Self {
        Self::new(self.factory.with_current_user(user))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, name: String) -> Result<Persisted<Team>, DomainError> {
        let team = Team::create(name);
        let id = team.id();

        let mut uow = self.factory.begin();
        uow.set::<Team>().add(team)?;
        uow.save().await?;
        Persisted::capture(&mut uow, id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: AggregateId) -> Result<Option<Persisted<Team>>, DomainError> {
        persisted::fetch(&self.factory, id).await
    }

    /// Adds an existing hero to the team.
    #[tracing::instrument(skip(self))]
    pub async fn add_hero(
        &self,
        team_id: AggregateId,
        hero_id: AggregateId,
    ) -> Result<Persisted<Team>, DomainError> {
        let mut uow = self.factory.begin();
        require(&mut uow.set::<Hero>(), hero_id).await?;

        let mut teams = uow.set::<Team>();
        require(&mut teams, team_id).await?.add_hero(hero_id)?;

        uow.save().await?;
        Persisted::capture(&mut uow, team_id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn assign_mission(
        &self,
        team_id: AggregateId,
        mission: String,
    ) -> Result<Persisted<Team>, DomainError> {
        let mut uow = self.factory.begin();
        let mut teams = uow.set::<Team>();
        require(&mut teams, team_id).await?.assign_mission(mission)?;

        uow.save().await?;
        Persisted::capture(&mut uow, team_id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn complete_mission(&self, team_id: AggregateId) -> Result<Persisted<Team>, DomainError> {
        let mut uow = self.factory.begin();
        let mut teams = uow.set::<Team>();
        require(&mut teams, team_id).await?.complete_mission()?;

        uow.save().await?;
        tracing::info!(team_id = %team_id, "Mission completed");
        Persisted::capture(&mut uow, team_id)
    }
}
