//! Trainer aggregate. Trainers raise no domain events.

mod aggregate;
mod configuration;
mod service;

pub use aggregate::Trainer;
pub use configuration::TrainerConfiguration;
pub use service::TrainerService;

use thiserror::Error;

/// Errors that can occur during trainer operations.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}
