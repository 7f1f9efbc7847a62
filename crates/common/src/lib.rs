//! Shared types for the gym persistence workspace.
//!
//! Holds the aggregate identifier plus the two ambient collaborators the
//! save pipeline depends on: a clock and a current-user provider.

pub mod clock;
pub mod current_user;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use current_user::{Anonymous, CurrentUser, StaticUser};
pub use types::AggregateId;
