//! Domain error types.

use common::AggregateId;
use persistence::PersistenceError;
use thiserror::Error;

use crate::client::ClientError;
use crate::exercise::ExerciseError;
use crate::hero::HeroError;
use crate::team::TeamError;
use crate::trainer::TrainerError;
use crate::workout_plan::WorkoutPlanError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred while loading or saving.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Exercise error: {0}")]
    Exercise(#[from] ExerciseError),

    #[error("Hero error: {0}")]
    Hero(#[from] HeroError),

    #[error("Team error: {0}")]
    Team(#[from] TeamError),

    #[error("Trainer error: {0}")]
    Trainer(#[from] TrainerError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Workout plan error: {0}")]
    WorkoutPlan(#[from] WorkoutPlanError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {id}")]
    NotFound {
        aggregate_type: &'static str,
        id: AggregateId,
    },
}

impl DomainError {
    pub(crate) fn not_found<A: persistence::Aggregate>(id: AggregateId) -> Self {
        DomainError::NotFound {
            aggregate_type: A::aggregate_type(),
            id,
        }
    }

    /// True when the caller may re-run the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Persistence(e) if e.is_retryable())
    }

    /// True when input was rejected by a business rule or a column constraint.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            DomainError::Persistence(e) => matches!(e, PersistenceError::Validation { .. }),
            DomainError::NotFound { .. } => false,
            _ => true,
        }
    }
}
