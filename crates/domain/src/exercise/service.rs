//! Exercise service providing the catalogue operations.

use std::sync::Arc;

use common::{AggregateId, CurrentUser};
use persistence::{Aggregate, ContextFactory, RecordQuery, RecordStore};

use crate::error::DomainError;
use crate::persisted::{self, Persisted, require};

use super::{CreateExercise, Exercise, MuscleGroup, UpdateExerciseDetails};

/// Service for managing exercises.
///
/// Every call runs in its own unit of work and saves before returning.
pub struct ExerciseService<S> {
    factory: ContextFactory<S>,
}

impl<S> Clone for ExerciseService<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<S: RecordStore> ExerciseService<S> {
    /// Creates a new exercise service over the given context factory.
    pub fn new(factory: ContextFactory<S>) -> Self {
        Self { factory }
    }

    /// A copy of this service whose saves are attributed to `user`.
    pub fn acting_as(&self, user: Arc<dyn CurrentUser>) -> Self {
        Self::new(self.factory.with_current_user(user))
    }

    /// Adds a new exercise.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, cmd: CreateExercise) -> Result<Persisted<Exercise>, DomainError> {
        let exercise = Exercise::create(
            cmd.name,
            cmd.description,
            cmd.exercise_type,
            cmd.muscle_groups,
        )?;
        let id = exercise.id();

        let mut uow = self.factory.begin();
        uow.set::<Exercise>().add(exercise)?;
        uow.save().await?;

        tracing::info!(exercise_id = %id, "Exercise created");
        Persisted::capture(&mut uow, id)
    }

    /// Loads an exercise by ID.
    ///
    /// Returns None if the exercise doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: AggregateId) -> Result<Option<Persisted<Exercise>>, DomainError> {
        persisted::fetch(&self.factory, id).await
    }

    /// Lists exercises matching `query`, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: RecordQuery) -> Result<Vec<Persisted<Exercise>>, DomainError> {
        persisted::list(&self.factory, &query).await
    }

    /// Replaces name, description and type of an exercise, and its muscle
    /// groups when the command carries them. One save covers both; when it
    /// writes nothing the stored exercise is returned.
    #[tracing::instrument(skip(self))]
    pub async fn update_details(
        &self,
        id: AggregateId,
        cmd: UpdateExerciseDetails,
    ) -> Result<Persisted<Exercise>, DomainError> {
        let mut uow = self.factory.begin();
        let mut exercises = uow.set::<Exercise>();
        let exercise = require(&mut exercises, id).await?;
        exercise.update_details(cmd.name, cmd.description, cmd.exercise_type);
        if let Some(groups) = cmd.muscle_groups {
            exercise.change_muscle_groups(groups)?;
        }

        let written = uow.save().await?;
        persisted::saved(&mut uow, &self.factory, id, written).await
    }

    /// Replaces the worked muscle groups of an exercise.
    ///
    /// Passing the current groups in another order saves nothing and returns
    /// the groups in their stored order.
    #[tracing::instrument(skip(self))]
    pub async fn change_muscle_groups(
        &self,
        id: AggregateId,
        groups: Vec<MuscleGroup>,
    ) -> Result<Persisted<Exercise>, DomainError> {
        let mut uow = self.factory.begin();
        let mut exercises = uow.set::<Exercise>();
        let exercise = require(&mut exercises, id).await?;
        exercise.change_muscle_groups(groups)?;

        let written = uow.save().await?;
        tracing::debug!(exercise_id = %id, written, "Muscle groups saved");
        persisted::saved(&mut uow, &self.factory, id, written).await
    }

    /// Deletes an exercise.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: AggregateId) -> Result<(), DomainError> {
        let mut uow = self.factory.begin();
        let mut exercises = uow.set::<Exercise>();
        require(&mut exercises, id).await?;
        exercises.remove(id)?;

        uow.save().await?;
        tracing::info!(exercise_id = %id, "Exercise deleted");
        Ok(())
    }
}
