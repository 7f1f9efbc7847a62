//! HTTP handlers and the state they share.

pub mod exercises;
pub mod health;
pub mod metrics;
pub mod trainers;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::{AggregateId, CurrentUser, StaticUser};
use domain::{ExerciseService, TrainerService};

use crate::error::ApiError;

/// Header carrying the acting user's identifier.
pub const USER_HEADER: &str = "x-user-id";

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub exercises: ExerciseService<S>,
    pub trainers: TrainerService<S>,

    /// Name of the record store backing this process ("memory" or "postgres").
    pub backend: &'static str,
}

/// The acting user, taken from the `x-user-id` header.
///
/// A missing or blank header means no actor; saves still succeed and leave
/// the created-by/modified-by columns empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub Option<String>);

impl Actor {
    pub fn current_user(&self) -> Arc<dyn CurrentUser> {
        Arc::new(StaticUser::from_option(self.0.clone()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_HEADER) else {
            return Ok(Actor(None));
        };

        let value = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{USER_HEADER} must be visible ASCII")))?
            .trim();
        Ok(Actor((!value.is_empty()).then(|| value.to_string())))
    }
}

pub(crate) fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
