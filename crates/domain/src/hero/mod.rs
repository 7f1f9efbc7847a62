//! Hero aggregate and related types.

mod aggregate;
mod configuration;
mod events;
mod service;

pub use aggregate::{Hero, Power};
pub use configuration::HeroConfiguration;
pub use events::{HeroCreatedData, HeroEvent, PowerAddedData};
pub use service::HeroService;

use thiserror::Error;

/// Errors that can occur during hero operations.
#[derive(Debug, Error)]
pub enum HeroError {
    /// The hero already has a power with this name.
    #[error("Hero already has power: {0}")]
    DuplicatePower(String),

    /// A power's level is outside 1..=100.
    #[error("Invalid power level: {0} (must be between 1 and 100)")]
    InvalidPowerLevel(u32),
}
