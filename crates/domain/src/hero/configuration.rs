//! Table mapping for the hero aggregate.

use persistence::{EntityConfiguration, EntityType, JsonConverter, Property, UnorderedListComparer};

use super::{Hero, Power};

/// Maps [`Hero`] onto the `heroes` table.
pub struct HeroConfiguration;

impl HeroConfiguration {
    pub const TABLE: &'static str = "heroes";

    fn name() -> Property<Hero, String> {
        Property::new("name", |h: &Hero| h.name().to_string())
            .required()
            .max_length(100)
    }

    fn alias() -> Property<Hero, String> {
        Property::new("alias", |h: &Hero| h.alias().to_string())
            .required()
            .max_length(10)
    }

    /// Derived from the powers; stored for querying only.
    fn power_level() -> Property<Hero, i64> {
        Property::new("power_level", Hero::power_level)
    }

    fn powers() -> Property<Hero, Vec<Power>> {
        Property::converted("powers", |h: &Hero| h.powers().to_vec(), JsonConverter)
            .with_comparer(UnorderedListComparer)
    }
}

impl EntityConfiguration for HeroConfiguration {
    type Entity = Hero;

    fn configure() -> EntityType<Hero> {
        EntityType::builder(Self::TABLE)
            .property(Self::name())
            .property(Self::alias())
            .property(Self::power_level())
            .property(Self::powers())
            .build(|row| {
                Ok(Hero::restore(
                    row.id(),
                    row.read(&Self::name())?,
                    row.read(&Self::alias())?,
                    row.read(&Self::powers())?,
                ))
            })
    }
}
