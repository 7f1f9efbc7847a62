//! Trainer endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Persisted, Trainer};
use persistence::{Aggregate, AuditMetadata, RecordStore};
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, parse_aggregate_id};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterTrainerRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TrainerResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub version: i64,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl From<Persisted<Trainer>> for TrainerResponse {
    fn from(saved: Persisted<Trainer>) -> Self {
        let trainer = saved.aggregate;
        Self {
            id: trainer.id().to_string(),
            first_name: trainer.first_name().to_string(),
            last_name: trainer.last_name().to_string(),
            email: trainer.email().to_string(),
            version: saved.version.as_i64(),
            audit: saved.audit,
        }
    }
}

/// POST /trainers
#[tracing::instrument(skip(state, req))]
pub async fn register<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Json(req): Json<RegisterTrainerRequest>,
) -> Result<(StatusCode, Json<TrainerResponse>), ApiError> {
    let saved = state
        .trainers
        .acting_as(actor.current_user())
        .register(req.first_name, req.last_name, req.email)
        .await?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// GET /trainers/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<TrainerResponse>, ApiError> {
    let trainer_id = parse_aggregate_id(&id)?;
    let saved = state
        .trainers
        .get(trainer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Trainer {id} not found")))?;

    Ok(Json(saved.into()))
}
