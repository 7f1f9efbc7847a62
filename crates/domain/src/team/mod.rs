//! Team aggregate and related types.

mod aggregate;
mod configuration;
mod events;
mod service;

pub use aggregate::Team;
pub use configuration::TeamConfiguration;
pub use events::{
    HeroJoinedTeamData, MissionAssignedData, MissionCompletedData, TeamCreatedData, TeamEvent,
};
pub use service::TeamService;

use common::AggregateId;
use thiserror::Error;

/// Errors that can occur during team operations.
#[derive(Debug, Error)]
pub enum TeamError {
    #[error("Hero {0} is already a member")]
    HeroAlreadyMember(AggregateId),

    /// A new mission was assigned while another one is still open.
    #[error("Team is already on a mission: {0}")]
    MissionInProgress(String),

    #[error("Team has no mission to complete")]
    NoMission,

    #[error("Mission description cannot be empty")]
    EmptyMission,
}
