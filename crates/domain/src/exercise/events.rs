//! Exercise domain events.

use common::AggregateId;
use persistence::DomainEvent;
use serde::{Deserialize, Serialize};

use super::{ExerciseType, MuscleGroup};

/// Events raised by the exercise aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ExerciseEvent {
    /// Exercise was added to the catalogue.
    ExerciseCreated(ExerciseCreatedData),

    /// Name, description or type changed.
    ExerciseUpdated(ExerciseUpdatedData),

    /// The set of worked muscle groups changed.
    MuscleGroupsChanged(MuscleGroupsChangedData),
}

impl DomainEvent for ExerciseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExerciseEvent::ExerciseCreated(_) => "ExerciseCreated",
            ExerciseEvent::ExerciseUpdated(_) => "ExerciseUpdated",
            ExerciseEvent::MuscleGroupsChanged(_) => "MuscleGroupsChanged",
        }
    }
}

/// Data for ExerciseCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCreatedData {
    pub exercise_id: AggregateId,
    pub name: String,
    pub exercise_type: ExerciseType,
    pub muscle_groups: Vec<MuscleGroup>,
}

/// Data for ExerciseUpdated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseUpdatedData {
    pub exercise_id: AggregateId,
    pub name: String,
    pub description: Option<String>,
    pub exercise_type: ExerciseType,
}

/// Data for MuscleGroupsChanged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleGroupsChangedData {
    pub exercise_id: AggregateId,
    pub previous: Vec<MuscleGroup>,
    pub current: Vec<MuscleGroup>,
}
