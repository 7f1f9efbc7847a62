//! Team domain events.

use common::AggregateId;
use persistence::DomainEvent;
use serde::{Deserialize, Serialize};

/// Events raised by the team aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TeamEvent {
    TeamCreated(TeamCreatedData),
    HeroJoinedTeam(HeroJoinedTeamData),
    MissionAssigned(MissionAssignedData),
    MissionCompleted(MissionCompletedData),
}

impl DomainEvent for TeamEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TeamEvent::TeamCreated(_) => "TeamCreated",
            TeamEvent::HeroJoinedTeam(_) => "HeroJoinedTeam",
            TeamEvent::MissionAssigned(_) => "MissionAssigned",
            TeamEvent::MissionCompleted(_) => "MissionCompleted",
        }
    }
}

/// Data for TeamCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCreatedData {
    pub team_id: AggregateId,
    pub name: String,
}

/// Data for HeroJoinedTeam event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroJoinedTeamData {
    pub team_id: AggregateId,
    pub hero_id: AggregateId,
}

/// Data for MissionAssigned event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAssignedData {
    pub team_id: AggregateId,
    pub mission: String,
}

/// Data for MissionCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionCompletedData {
    pub team_id: AggregateId,
    pub mission: String,

    /// Number of missions completed including this one.
    pub missions_completed: i64,
}
