//! Table mapping for the team aggregate.

use common::AggregateId;
use persistence::{EntityConfiguration, EntityType, JsonConverter, Property, UnorderedListComparer};

use super::Team;

/// Maps [`Team`] onto the `teams` table.
pub struct TeamConfiguration;

impl TeamConfiguration {
    pub const TABLE: &'static str = "teams";

    fn name() -> Property<Team, String> {
        Property::new("name", |t: &Team| t.name().to_string())
            .required()
            .max_length(100)
    }

    /// Membership is a set; order of joining is not persisted as a change.
    fn hero_ids() -> Property<Team, Vec<AggregateId>> {
        Property::converted("hero_ids", |t: &Team| t.hero_ids().to_vec(), JsonConverter)
            .with_comparer(UnorderedListComparer)
    }

    fn mission() -> Property<Team, Option<String>> {
        Property::new("mission", |t: &Team| t.mission().map(str::to_string)).max_length(500)
    }

    fn missions_completed() -> Property<Team, i64> {
        Property::new("missions_completed", Team::missions_completed)
    }
}

impl EntityConfiguration for TeamConfiguration {
    type Entity = Team;

    fn configure() -> EntityType<Team> {
        EntityType::builder(Self::TABLE)
            .property(Self::name())
            .property(Self::hero_ids())
            .property(Self::mission())
            .property(Self::missions_completed())
            .build(|row| {
                Ok(Team::restore(
                    row.id(),
                    row.read(&Self::name())?,
                    row.read(&Self::hero_ids())?,
                    row.read(&Self::mission())?,
                    row.read(&Self::missions_completed())?,
                ))
            })
    }
}
