//! Exercise commands.

use serde::Deserialize;

use super::{ExerciseType, MuscleGroup};

/// Command to add an exercise to the catalogue.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExercise {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub exercise_type: ExerciseType,

    #[serde(default)]
    pub muscle_groups: Vec<MuscleGroup>,
}

impl CreateExercise {
    /// Creates a new CreateExercise command with no description.
    pub fn new(
        name: impl Into<String>,
        exercise_type: ExerciseType,
        muscle_groups: Vec<MuscleGroup>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            exercise_type,
            muscle_groups,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Command to replace an exercise's descriptive fields.
///
/// Muscle groups are left alone unless given.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExerciseDetails {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub exercise_type: ExerciseType,

    #[serde(default)]
    pub muscle_groups: Option<Vec<MuscleGroup>>,
}
