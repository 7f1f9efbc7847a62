//! Hero aggregate implementation.

use common::AggregateId;
use persistence::{Aggregate, DomainEvents, EventSource, HasDomainEvents};
use serde::{Deserialize, Serialize};

use super::{HeroCreatedData, HeroError, HeroEvent, PowerAddedData};

/// A named ability with its own strength.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Power {
    pub name: String,
    pub power_level: u32,
}

impl Power {
    pub fn new(name: impl Into<String>, power_level: u32) -> Self {
        Self {
            name: name.into(),
            power_level,
        }
    }
}

/// A hero that can be recruited into teams.
///
/// The hero's power level is the sum of its powers' levels.
#[derive(Debug, Clone)]
pub struct Hero {
    id: AggregateId,
    name: String,
    alias: String,
    powers: Vec<Power>,
    events: DomainEvents<HeroEvent>,
}

impl Hero {
    /// Creates a new hero with no powers and raises `HeroCreated`.
    pub fn create(name: impl Into<String>, alias: impl Into<String>) -> Self {
        let mut hero = Self::restore(AggregateId::new(), name.into(), alias.into(), Vec::new());
        hero.add_domain_event(HeroEvent::HeroCreated(HeroCreatedData {
            hero_id: hero.id,
            name: hero.name.clone(),
            alias: hero.alias.clone(),
        }));
        hero
    }

    /// Rebuilds a hero from stored state. Raises no events.
    pub fn restore(id: AggregateId, name: String, alias: String, powers: Vec<Power>) -> Self {
        Self {
            id,
            name,
            alias,
            powers,
            events: DomainEvents::new(),
        }
    }

    // Query methods

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn powers(&self) -> &[Power] {
        &self.powers
    }

    pub fn power_level(&self) -> i64 {
        self.powers.iter().map(|p| i64::from(p.power_level)).sum()
    }

    // Command methods

    /// Grants a new power.
    pub fn add_power(&mut self, power: Power) -> Result<(), HeroError> {
        if !(1..=100).contains(&power.power_level) {
            return Err(HeroError::InvalidPowerLevel(power.power_level));
        }
        if self.powers.iter().any(|p| p.name == power.name) {
            return Err(HeroError::DuplicatePower(power.name));
        }

        self.powers.push(power.clone());
        let power_level = self.power_level();
        self.add_domain_event(HeroEvent::PowerAdded(PowerAddedData {
            hero_id: self.id,
            power,
            power_level,
        }));
        Ok(())
    }
}

impl HasDomainEvents for Hero {
    type Event = HeroEvent;

    fn add_domain_event(&mut self, event: HeroEvent) {
        self.events.add(event);
    }

    fn pop_domain_events(&mut self) -> Vec<HeroEvent> {
        self.events.pop()
    }
}

impl Aggregate for Hero {
    fn aggregate_type() -> &'static str {
        "Hero"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_level_is_the_sum_of_powers() {
        let mut hero = Hero::create("Diana Prince", "Wonder");
        hero.add_power(Power::new("Strength", 90)).unwrap();
        hero.add_power(Power::new("Flight", 40)).unwrap();

        assert_eq!(hero.power_level(), 130);

        let events = hero.pop_domain_events();
        assert_eq!(events.len(), 3);
        match &events[2] {
            HeroEvent::PowerAdded(data) => assert_eq!(data.power_level, 130),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_power_is_rejected() {
        let mut hero = Hero::create("Barry Allen", "Flash");
        hero.add_power(Power::new("Speed", 100)).unwrap();

        let result = hero.add_power(Power::new("Speed", 50));
        assert!(matches!(result, Err(HeroError::DuplicatePower(name)) if name == "Speed"));
        assert_eq!(hero.powers().len(), 1);
    }

    #[test]
    fn test_power_level_bounds() {
        let mut hero = Hero::create("Arthur Curry", "Aquaman");
        assert!(matches!(
            hero.add_power(Power::new("Swim", 0)),
            Err(HeroError::InvalidPowerLevel(0))
        ));
        assert!(matches!(
            hero.add_power(Power::new("Swim", 101)),
            Err(HeroError::InvalidPowerLevel(101))
        ));
    }
}
