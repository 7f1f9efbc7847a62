//! Client aggregate and related types.

mod aggregate;
mod configuration;
mod events;
mod service;

pub use aggregate::Client;
pub use configuration::ClientConfiguration;
pub use events::{ClientAssignedToTrainerData, ClientEvent, ClientRegisteredData};
pub use service::ClientService;

use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}
