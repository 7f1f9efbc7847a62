//! Exercise catalogue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{CreateExercise, Exercise, ExerciseType, MuscleGroup, Persisted, UpdateExerciseDetails};
use persistence::{Aggregate, AuditMetadata, RecordQuery, RecordStore};
use serde::{Deserialize, Serialize};

use super::{Actor, AppState, parse_aggregate_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub created_by: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListParams {
    fn into_query(self) -> RecordQuery {
        let mut query = RecordQuery::new();
        if let Some(actor) = self.created_by {
            query = query.created_by(actor);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        query
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub exercise_type: ExerciseType,
    pub muscle_groups: Vec<MuscleGroup>,
    pub version: i64,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl From<Persisted<Exercise>> for ExerciseResponse {
    fn from(saved: Persisted<Exercise>) -> Self {
        let exercise = saved.aggregate;
        Self {
            id: exercise.id().to_string(),
            name: exercise.name().to_string(),
            description: exercise.description().map(str::to_string),
            exercise_type: exercise.exercise_type(),
            muscle_groups: exercise.muscle_groups().to_vec(),
            version: saved.version.as_i64(),
            audit: saved.audit,
        }
    }
}

// -- Handlers --

/// POST /exercises: add an exercise to the catalogue.
#[tracing::instrument(skip(state, cmd))]
pub async fn create<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Json(cmd): Json<CreateExercise>,
) -> Result<(StatusCode, Json<ExerciseResponse>), ApiError> {
    let saved = state
        .exercises
        .acting_as(actor.current_user())
        .create(cmd)
        .await?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// GET /exercises: list exercises, oldest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ExerciseResponse>>, ApiError> {
    let exercises = state.exercises.list(params.into_query()).await?;
    Ok(Json(exercises.into_iter().map(Into::into).collect()))
}

/// GET /exercises/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ExerciseResponse>, ApiError> {
    let exercise_id = parse_aggregate_id(&id)?;
    let saved = state
        .exercises
        .get(exercise_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Exercise {id} not found")))?;

    Ok(Json(saved.into()))
}

/// PUT /exercises/{id}: replace the descriptive fields (and optionally the
/// muscle groups) in one save.
#[tracing::instrument(skip(state, cmd))]
pub async fn update<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Path(id): Path<String>,
    Json(cmd): Json<UpdateExerciseDetails>,
) -> Result<Json<ExerciseResponse>, ApiError> {
    let exercise_id = parse_aggregate_id(&id)?;
    let saved = state
        .exercises
        .acting_as(actor.current_user())
        .update_details(exercise_id, cmd)
        .await?;

    Ok(Json(saved.into()))
}

/// DELETE /exercises/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: RecordStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let exercise_id = parse_aggregate_id(&id)?;
    state
        .exercises
        .acting_as(actor.current_user())
        .delete(exercise_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
