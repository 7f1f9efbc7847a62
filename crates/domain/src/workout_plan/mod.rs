//! Workout plan aggregate and related types.

mod aggregate;
mod configuration;
mod events;
mod service;

pub use aggregate::{PlannedExercise, WorkoutPlan};
pub use configuration::WorkoutPlanConfiguration;
pub use events::{ExerciseAddedToPlanData, WorkoutPlanCreatedData, WorkoutPlanEvent};
pub use service::WorkoutPlanService;

use thiserror::Error;

/// Errors that can occur during workout plan operations.
#[derive(Debug, Error)]
pub enum WorkoutPlanError {
    #[error("Invalid sets: {0} (must be greater than 0)")]
    InvalidSets(u32),

    #[error("Invalid reps: {0} (must be greater than 0)")]
    InvalidReps(u32),
}
