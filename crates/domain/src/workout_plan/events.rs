//! Workout plan domain events.

use common::AggregateId;
use persistence::DomainEvent;
use serde::{Deserialize, Serialize};

use super::PlannedExercise;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkoutPlanEvent {
    WorkoutPlanCreated(WorkoutPlanCreatedData),
    ExerciseAddedToPlan(ExerciseAddedToPlanData),
}

impl DomainEvent for WorkoutPlanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WorkoutPlanEvent::WorkoutPlanCreated(_) => "WorkoutPlanCreated",
            WorkoutPlanEvent::ExerciseAddedToPlan(_) => "ExerciseAddedToPlan",
        }
    }
}

/// Data for WorkoutPlanCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlanCreatedData {
    pub plan_id: AggregateId,
    pub name: String,
    pub client_id: AggregateId,
    pub trainer_id: AggregateId,
}

/// Data for ExerciseAddedToPlan event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseAddedToPlanData {
    pub plan_id: AggregateId,
    pub entry: PlannedExercise,

    /// Position of the entry in the plan, starting at 0.
    pub position: usize,
}
