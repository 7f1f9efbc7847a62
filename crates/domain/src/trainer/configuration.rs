use persistence::{EntityConfiguration, EntityType, Property};

use super::Trainer;

/// Maps [`Trainer`] onto the `trainers` table.
pub struct TrainerConfiguration;

impl TrainerConfiguration {
    pub const TABLE: &'static str = "trainers";

    fn first_name() -> Property<Trainer, String> {
        Property::new("first_name", |t: &Trainer| t.first_name().to_string())
            .required()
            .max_length(50)
    }

    fn last_name() -> Property<Trainer, String> {
        Property::new("last_name", |t: &Trainer| t.last_name().to_string())
            .required()
            .max_length(50)
    }

    fn email() -> Property<Trainer, String> {
        Property::new("email", |t: &Trainer| t.email().to_string())
            .required()
            .max_length(254)
    }
}

impl EntityConfiguration for TrainerConfiguration {
    type Entity = Trainer;

    fn configure() -> EntityType<Trainer> {
        EntityType::builder(Self::TABLE)
            .property(Self::first_name())
            .property(Self::last_name())
            .property(Self::email())
            .build(|row| {
                Ok(Trainer::restore(
                    row.id(),
                    row.read(&Self::first_name())?,
                    row.read(&Self::last_name())?,
                    row.read(&Self::email())?,
                ))
            })
    }
}
