use common::AggregateId;
use persistence::{EntityConfiguration, EntityType, Property};

use super::Client;

/// Maps [`Client`] onto the `clients` table.
pub struct ClientConfiguration;

impl ClientConfiguration {
    pub const TABLE: &'static str = "clients";

    fn first_name() -> Property<Client, String> {
        Property::new("first_name", |c: &Client| c.first_name().to_string())
            .required()
            .max_length(50)
    }

    fn last_name() -> Property<Client, String> {
        Property::new("last_name", |c: &Client| c.last_name().to_string())
            .required()
            .max_length(50)
    }

    fn email() -> Property<Client, String> {
        Property::new("email", |c: &Client| c.email().to_string())
            .required()
            .max_length(254)
    }

    fn trainer_id() -> Property<Client, Option<AggregateId>> {
        Property::new("trainer_id", Client::trainer_id)
    }
}

impl EntityConfiguration for ClientConfiguration {
    type Entity = Client;

    fn configure() -> EntityType<Client> {
        EntityType::builder(Self::TABLE)
            .property(Self::first_name())
            .property(Self::last_name())
            .property(Self::email())
            .property(Self::trainer_id())
            .build(|row| {
                Ok(Client::restore(
                    row.id(),
                    row.read(&Self::first_name())?,
                    row.read(&Self::last_name())?,
                    row.read(&Self::email())?,
                    row.read(&Self::trainer_id())?,
                ))
            })
    }
}
