//! HTTP API for the gym aggregates.
//!
//! Each request opens its own unit of work through a domain service; the
//! acting user comes from the `x-user-id` header and ends up in the audit
//! columns. Structured logging (tracing) and Prometheus metrics included.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{ExerciseService, TrainerService, gym_model};
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::{ContextFactory, EventDispatcher, RecordStore, TracingDispatcher};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RecordStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/exercises",
            get(routes::exercises::list::<S>).post(routes::exercises::create::<S>),
        )
        .route(
            "/exercises/{id}",
            get(routes::exercises::get::<S>)
                .put(routes::exercises::update::<S>)
                .delete(routes::exercises::delete::<S>),
        )
        .route("/trainers", axum::routing::post(routes::trainers::register::<S>))
        .route("/trainers/{id}", get(routes::trainers::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`, logging every dispatched
/// event.
pub fn create_default_state<S: RecordStore + 'static>(
    store: S,
    backend: &'static str,
) -> persistence::Result<Arc<AppState<S>>> {
    create_state(store, backend, Arc::new(TracingDispatcher))
}

/// Creates the application state over `store`, handing events committed by
/// every save to `dispatcher`.
pub fn create_state<S: RecordStore + 'static>(
    store: S,
    backend: &'static str,
    dispatcher: Arc<dyn EventDispatcher>,
) -> persistence::Result<Arc<AppState<S>>> {
    let factory = ContextFactory::builder(store, gym_model()?)
        .dispatcher(dispatcher)
        .build();

    Ok(Arc::new(AppState {
        exercises: ExerciseService::new(factory.clone()),
        trainers: TrainerService::new(factory),
        backend,
    }))
}
