//! Table mapping for the exercise aggregate.

use persistence::{
    EntityConfiguration, EntityType, EnumTextConverter, JsonConverter, Property,
    UnorderedListComparer,
};

use super::{Exercise, ExerciseType, MuscleGroup};

/// Maps [`Exercise`] onto the `exercises` table.
pub struct ExerciseConfiguration;

impl ExerciseConfiguration {
    pub const TABLE: &'static str = "exercises";

    fn name() -> Property<Exercise, String> {
        Property::new("name", |e: &Exercise| e.name().to_string())
            .required()
            .max_length(100)
    }

    fn description() -> Property<Exercise, Option<String>> {
        Property::new("description", |e: &Exercise| {
            e.description().map(str::to_string)
        })
        .max_length(500)
    }

    fn exercise_type() -> Property<Exercise, ExerciseType> {
        Property::converted(
            "exercise_type",
            |e: &Exercise| e.exercise_type(),
            EnumTextConverter::new(),
        )
        .required()
    }

    /// JSON text; group order is ignored when detecting changes.
    fn muscle_groups() -> Property<Exercise, Vec<MuscleGroup>> {
        Property::converted(
            "muscle_groups",
            |e: &Exercise| e.muscle_groups().to_vec(),
            JsonConverter,
        )
        .with_comparer(UnorderedListComparer)
    }
}

impl EntityConfiguration for ExerciseConfiguration {
    type Entity = Exercise;

    fn configure() -> EntityType<Exercise> {
        EntityType::builder(Self::TABLE)
            .property(Self::name())
            .property(Self::description())
            .property(Self::exercise_type())
            .property(Self::muscle_groups())
            .build(|row| {
                Ok(Exercise::restore(
                    row.id(),
                    row.read(&Self::name())?,
                    row.read(&Self::description())?,
                    row.read(&Self::exercise_type())?,
                    row.read(&Self::muscle_groups())?,
                ))
            })
    }
}
