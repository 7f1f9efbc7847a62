//! Gym domain: aggregates, their table mappings and the services that
//! drive them through a unit of work.
//!
//! Aggregates:
//! - [`Exercise`] catalogue entries with an order-insensitive muscle group set
//! - [`Hero`] and [`Team`]
//! - [`Trainer`] (no domain events), [`Client`] and [`WorkoutPlan`]

pub mod client;
mod email;
pub mod error;
pub mod exercise;
pub mod hero;
pub mod model;
pub mod persisted;
pub mod team;
pub mod trainer;
pub mod workout_plan;

pub use client::{
    Client, ClientAssignedToTrainerData, ClientConfiguration, ClientError, ClientEvent,
    ClientRegisteredData, ClientService,
};
pub use error::DomainError;
pub use exercise::{
    CreateExercise, Exercise, ExerciseConfiguration, ExerciseCreatedData, ExerciseError,
    ExerciseEvent, ExerciseService, ExerciseType, ExerciseUpdatedData, MuscleGroup,
    MuscleGroupsChangedData, UpdateExerciseDetails,
};
pub use hero::{
    Hero, HeroConfiguration, HeroCreatedData, HeroError, HeroEvent, HeroService, Power,
    PowerAddedData,
};
pub use model::gym_model;
pub use persisted::Persisted;
pub use team::{
    HeroJoinedTeamData, MissionAssignedData, MissionCompletedData, Team, TeamConfiguration,
    TeamCreatedData, TeamError, TeamEvent, TeamService,
};
pub use trainer::{Trainer, TrainerConfiguration, TrainerError, TrainerService};
pub use workout_plan::{
    ExerciseAddedToPlanData, PlannedExercise, WorkoutPlan, WorkoutPlanConfiguration,
    WorkoutPlanCreatedData, WorkoutPlanError, WorkoutPlanEvent, WorkoutPlanService,
};
