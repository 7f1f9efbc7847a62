//! Team aggregate implementation.

use common::AggregateId;
use persistence::{Aggregate, DomainEvents, EventSource, HasDomainEvents};

use super::{
    HeroJoinedTeamData, MissionAssignedData, MissionCompletedData, TeamCreatedData, TeamError,
    TeamEvent,
};

/// A group of heroes working one mission at a time.
#[derive(Debug, Clone)]
pub struct Team {
    id: AggregateId,
    name: String,
    hero_ids: Vec<AggregateId>,
    mission: Option<String>,
    missions_completed: i64,
    events: DomainEvents<TeamEvent>,
}

impl Team {
    /// Creates an empty team and raises `TeamCreated`.
    pub fn create(name: impl Into<String>) -> Self {
        let mut team = Self::restore(AggregateId::new(), name.into(), Vec::new(), None, 0);
        team.add_domain_event(TeamEvent::TeamCreated(TeamCreatedData {
            team_id: team.id,
            name: team.name.clone(),
        }));
        team
    }

    /// Rebuilds a team from stored state. Raises no events.
    pub fn restore(
        id: AggregateId,
        name: String,
        hero_ids: Vec<AggregateId>,
        mission: Option<String>,
        missions_completed: i64,
    ) -> Self {
        Self {
            id,
            name,
            hero_ids,
            mission,
            missions_completed,
            events: DomainEvents::new(),
        }
    }

    // Query methods

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hero_ids(&self) -> &[AggregateId] {
        &self.hero_ids
    }

    pub fn is_member(&self, hero_id: AggregateId) -> bool {
        self.hero_ids.contains(&hero_id)
    }

    pub fn mission(&self) -> Option<&str> {
        self.mission.as_deref()
    }

    pub fn missions_completed(&self) -> i64 {
        self.missions_completed
    }

    // Command methods

    pub fn add_hero(&mut self, hero_id: AggregateId) -> Result<(), TeamError> {
        if self.is_member(hero_id) {
            return Err(TeamError::HeroAlreadyMember(hero_id));
        }

        self.hero_ids.push(hero_id);
        self.add_domain_event(TeamEvent::HeroJoinedTeam(HeroJoinedTeamData {
            team_id: self.id,
            hero_id,
        }));
        Ok(())
    }

    /// Sends the team on a mission. Only one mission can be open at a time.
    pub fn assign_mission(&mut self, mission: impl Into<String>) -> Result<(), TeamError> {
        let mission = mission.into();
        if mission.trim().is_empty() {
            return Err(TeamError::EmptyMission);
        }
        if let Some(current) = &self.mission {
            return Err(TeamError::MissionInProgress(current.clone()));
        }

        self.mission = Some(mission.clone());
        self.add_domain_event(TeamEvent::MissionAssigned(MissionAssignedData {
            team_id: self.id,
            mission,
        }));
        Ok(())
    }

    /// Closes the open mission and bumps the completed count.
    pub fn complete_mission(&mut self) -> Result<(), TeamError> {
        let Some(mission) = self.mission.take() else {
            return Err(TeamError::NoMission);
        };

        self.missions_completed += 1;
        self.add_domain_event(TeamEvent::MissionCompleted(MissionCompletedData {
            team_id: self.id,
            mission,
            missions_completed: self.missions_completed,
        }));
        Ok(())
    }
}

impl HasDomainEvents for Team {
    type Event = TeamEvent;

    fn add_domain_event(&mut self, event: TeamEvent) {
        self.events.add(event);
    }

    fn pop_domain_events(&mut self) -> Vec<TeamEvent> {
        self.events.pop()
    }
}

impl Aggregate for Team {
    fn aggregate_type() -> &'static str {
        "Team"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}
