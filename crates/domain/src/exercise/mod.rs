//! Exercise aggregate and related types.

mod aggregate;
mod commands;
mod configuration;
mod events;
mod service;
mod value_objects;

pub use aggregate::Exercise;
pub use commands::{CreateExercise, UpdateExerciseDetails};
pub use configuration::ExerciseConfiguration;
pub use events::{ExerciseCreatedData, ExerciseEvent, ExerciseUpdatedData, MuscleGroupsChangedData};
pub use service::ExerciseService;
pub use value_objects::{ExerciseType, MuscleGroup};

use thiserror::Error;

/// Errors that can occur during exercise operations.
#[derive(Debug, Error)]
pub enum ExerciseError {
    /// The same muscle group was listed twice.
    #[error("Muscle group listed more than once: {0}")]
    DuplicateMuscleGroup(MuscleGroup),
}
