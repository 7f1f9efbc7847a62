//! Value objects for the exercise domain.

use serde::{Deserialize, Serialize};

/// Training category of an exercise. Stored as the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseType {
    Strength,
    Cardio,
    Flexibility,
    Balance,
    Plyometric,
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExerciseType::Strength => "Strength",
            ExerciseType::Cardio => "Cardio",
            ExerciseType::Flexibility => "Flexibility",
            ExerciseType::Balance => "Balance",
            ExerciseType::Plyometric => "Plyometric",
        };
        f.write_str(name)
    }
}

/// Muscle group worked by an exercise.
///
/// Ordered so that a list of groups can be compared as a multiset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Core,
    Glutes,
    Quadriceps,
    Hamstrings,
    Calves,
    FullBody,
}

impl std::fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
