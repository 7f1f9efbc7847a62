//! Workout plan aggregate implementation.

use common::AggregateId;
use persistence::{Aggregate, DomainEvents, EventSource, HasDomainEvents};
use serde::{Deserialize, Serialize};

use super::{ExerciseAddedToPlanData, WorkoutPlanCreatedData, WorkoutPlanError, WorkoutPlanEvent};

/// One exercise slot in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub exercise_id: AggregateId,
    pub sets: u32,
    pub reps: u32,
}

impl PlannedExercise {
    pub fn new(exercise_id: AggregateId, sets: u32, reps: u32) -> Self {
        Self {
            exercise_id,
            sets,
            reps,
        }
    }
}

/// A trainer's plan for a client. Exercise order is significant.
#[derive(Debug, Clone)]
pub struct WorkoutPlan {
    id: AggregateId,
    name: String,
    client_id: AggregateId,
    trainer_id: AggregateId,
    exercises: Vec<PlannedExercise>,
    events: DomainEvents<WorkoutPlanEvent>,
}

impl WorkoutPlan {
    /// Creates an empty plan and raises `WorkoutPlanCreated`.
    pub fn create(name: impl Into<String>, client_id: AggregateId, trainer_id: AggregateId) -> Self {
        let mut plan = Self::restore(
            AggregateId::new(),
            name.into(),
            client_id,
            trainer_id,
            Vec::new(),
        );
        plan.add_domain_event(WorkoutPlanEvent::WorkoutPlanCreated(WorkoutPlanCreatedData {
            plan_id: plan.id,
            name: plan.name.clone(),
            client_id,
            trainer_id,
        }));
        plan
    }

    /// Rebuilds a plan from stored state. Raises no events.
    pub fn restore(
        id: AggregateId,
        name: String,
        client_id: AggregateId,
        trainer_id: AggregateId,
        exercises: Vec<PlannedExercise>,
    ) -> Self {
        Self {
            id,
            name,
            client_id,
            trainer_id,
            exercises,
            events: DomainEvents::new(),
        }
    }

    // Query methods

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_id(&self) -> AggregateId {
        self.client_id
    }

    pub fn trainer_id(&self) -> AggregateId {
        self.trainer_id
    }

    pub fn exercises(&self) -> &[PlannedExercise] {
        &self.exercises
    }

    /// Total number of sets across the plan.
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }

    // Command methods

    /// Appends an exercise to the end of the plan.
    pub fn add_exercise(&mut self, entry: PlannedExercise) -> Result<(), WorkoutPlanError> {
        if entry.sets == 0 {
            return Err(WorkoutPlanError::InvalidSets(entry.sets));
        }
        if entry.reps == 0 {
            return Err(WorkoutPlanError::InvalidReps(entry.reps));
        }

        self.exercises.push(entry);
        self.add_domain_event(WorkoutPlanEvent::ExerciseAddedToPlan(
            ExerciseAddedToPlanData {
                plan_id: self.id,
                entry,
                position: self.exercises.len() - 1,
            },
        ));
        Ok(())
    }
}

impl HasDomainEvents for WorkoutPlan {
    type Event = WorkoutPlanEvent;

    fn add_domain_event(&mut self, event: WorkoutPlanEvent) {
        self.events.add(event);
    }

    fn pop_domain_events(&mut self) -> Vec<WorkoutPlanEvent> {
        self.events.pop()
    }
}

impl Aggregate for WorkoutPlan {
    fn aggregate_type() -> &'static str {
        "WorkoutPlan"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}
