//! The gym's persistence model.

use persistence::Model;

use crate::client::ClientConfiguration;
use crate::exercise::ExerciseConfiguration;
use crate::hero::HeroConfiguration;
use crate::team::TeamConfiguration;
use crate::trainer::TrainerConfiguration;
use crate::workout_plan::WorkoutPlanConfiguration;

/// Builds the model holding every gym aggregate's table mapping.
///
/// Meant to be called once at startup; the result is shared by every unit
/// of work through the context factory.
pub fn gym_model() -> persistence::Result<Model> {
    Ok(Model::builder()
        .apply::<ExerciseConfiguration>()?
        .apply::<HeroConfiguration>()?
        .apply::<TeamConfiguration>()?
        .apply::<TrainerConfiguration>()?
        .apply::<ClientConfiguration>()?
        .apply::<WorkoutPlanConfiguration>()?
        .build())
}
