//! Workout plan service.

use std::sync::Arc;

use common::{AggregateId, CurrentUser};
use persistence::{Aggregate, ContextFactory, RecordStore};

use crate::client::Client;
use crate::error::DomainError;
use crate::exercise::Exercise;
use crate::persisted::{self, Persisted, require};
use crate::trainer::Trainer;

use super::{PlannedExercise, WorkoutPlan};

/// Service for building workout plans.
pub struct WorkoutPlanService<S> {
    factory: ContextFactory<S>,
}

impl<S> Clone for WorkoutPlanService<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<S: RecordStore> WorkoutPlanService<S> {
    pub fn new(factory: ContextFactory<S>) -> Self {
        Self { factory }
    }

    pub fn acting_as(&self, user: Arc<dyn CurrentUser>) -> Self {
        Self::new(self.factory.with_current_user(user))
    }

    /// Creates an empty plan for an existing client and trainer.
    #[tracing::instrument(skip(self))]
    pub async fn create_plan(
        &self,
        name: String,
        client_id: AggregateId,
        trainer_id: AggregateId,
    ) -> Result<Persisted<WorkoutPlan>, DomainError> {
        let mut uow = self.factory.begin();
        require(&mut uow.set::<Client>(), client_id).await?;
        require(&mut uow.set::<Trainer>(), trainer_id).await?;

        let plan = WorkoutPlan::create(name, client_id, trainer_id);
        let id = plan.id();
        uow.set::<WorkoutPlan>().add(plan)?;
        uow.save().await?;
        Persisted::capture(&mut uow, id)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: AggregateId) -> Result<Option<Persisted<WorkoutPlan>>, DomainError> {
        persisted::fetch(&self.factory, id).await
    }

    /// Appends an existing exercise to a plan.
    #[tracing::instrument(skip(self))]
    pub async fn add_exercise(
        &self,
        plan_id: AggregateId,
        entry: PlannedExercise,
    ) -> Result<Persisted<WorkoutPlan>, DomainError> {
        let mut uow = self.factory.begin();
        require(&mut uow.set::<Exercise>(), entry.exercise_id).await?;

        let mut plans = uow.set::<WorkoutPlan>();
        require(&mut plans, plan_id).await?.add_exercise(entry)?;

        uow.save().await?;
        Persisted::capture(&mut uow, plan_id)
    }
}
