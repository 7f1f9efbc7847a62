//! Table mapping for the workout plan aggregate.

use common::AggregateId;
use persistence::{EntityConfiguration, EntityType, JsonConverter, Property};

use super::{PlannedExercise, WorkoutPlan};

/// Maps [`WorkoutPlan`] onto the `workout_plans` table.
pub struct WorkoutPlanConfiguration;

impl WorkoutPlanConfiguration {
    pub const TABLE: &'static str = "workout_plans";

    fn name() -> Property<WorkoutPlan, String> {
        Property::new("name", |p: &WorkoutPlan| p.name().to_string())
            .required()
            .max_length(100)
    }

    fn client_id() -> Property<WorkoutPlan, AggregateId> {
        Property::new("client_id", WorkoutPlan::client_id).required()
    }

    fn trainer_id() -> Property<WorkoutPlan, AggregateId> {
        Property::new("trainer_id", WorkoutPlan::trainer_id).required()
    }

    /// Ordered: moving an exercise is a change.
    fn exercises() -> Property<WorkoutPlan, Vec<PlannedExercise>> {
        Property::converted(
            "exercises",
            |p: &WorkoutPlan| p.exercises().to_vec(),
            JsonConverter,
        )
    }
}

impl EntityConfiguration for WorkoutPlanConfiguration {
    type Entity = WorkoutPlan;

    fn configure() -> EntityType<WorkoutPlan> {
        EntityType::builder(Self::TABLE)
            .property(Self::name())
            .property(Self::client_id())
            .property(Self::trainer_id())
            .property(Self::exercises())
            .build(|row| {
                Ok(WorkoutPlan::restore(
                    row.id(),
                    row.read(&Self::name())?,
                    row.read(&Self::client_id())?,
                    row.read(&Self::trainer_id())?,
                    row.read(&Self::exercises())?,
                ))
            })
    }
}
