//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use metrics_exporter_prometheus::PrometheusHandle;
use persistence::{FanOutDispatcher, InMemoryDispatcher, InMemoryStore, TracingDispatcher};
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

/// Router over an in-memory store, with a recorder for dispatched events.
fn setup() -> (axum::Router, Arc<InMemoryDispatcher>) {
    let events = Arc::new(InMemoryDispatcher::new());
    let dispatcher = FanOutDispatcher::new()
        .with(Arc::new(TracingDispatcher))
        .with(events.clone());
    let state = api::create_state(InMemoryStore::new(), "memory", Arc::new(dispatcher)).unwrap();
    let app = api::create_app(state, get_metrics_handle());
    (app, events)
}

fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn push_up() -> Value {
    json!({
        "name": "Push Up",
        "exercise_type": "Strength",
        "muscle_groups": ["Chest", "Triceps"]
    })
}

async fn create_push_up(app: &axum::Router, user: Option<&str>) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/exercises", user, push_up()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
}

#[tokio::test]
async fn test_create_exercise_stamps_actor() {
    let (app, events) = setup();

    let json = create_push_up(&app, Some("coach-7")).await;

    assert_eq!(json["name"], "Push Up");
    assert_eq!(json["muscle_groups"], json!(["Chest", "Triceps"]));
    assert_eq!(json["version"], 1);
    assert_eq!(json["created_by"], "coach-7");
    assert_eq!(json["modified_by"], "coach-7");
    assert!(json["created_at"].as_str().is_some());

    let dispatched = events.dispatched().await;
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].event_type, "ExerciseCreated");
}

#[tokio::test]
async fn test_missing_user_header_means_no_actor() {
    let (app, _) = setup();

    let json = create_push_up(&app, None).await;

    assert!(json["created_by"].is_null());
    assert!(json["created_at"].as_str().is_some());
}

#[tokio::test]
async fn test_update_keeps_creator() {
    let (app, _) = setup();
    let created = create_push_up(&app, Some("coach-7")).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/exercises/{id}"),
            Some("coach-9"),
            json!({
                "name": "Incline Push Up",
                "exercise_type": "Strength",
                "muscle_groups": ["Triceps", "Chest", "Shoulders"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], "Incline Push Up");
    assert_eq!(json["version"], 2);
    assert_eq!(json["created_by"], "coach-7");
    assert_eq!(json["modified_by"], "coach-9");
}

#[tokio::test]
async fn test_reorder_only_update_reports_stored_order() {
    let (app, _) = setup();
    let created = create_push_up(&app, Some("coach-7")).await;
    let uri = format!("/exercises/{}", created["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            Some("coach-9"),
            json!({
                "name": "Push Up",
                "exercise_type": "Strength",
                "muscle_groups": ["Triceps", "Chest"]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let put = body_json(response).await;
    assert_eq!(put["muscle_groups"], json!(["Chest", "Triceps"]));
    assert_eq!(put["version"], 1);
    assert_eq!(put["modified_by"], "coach-7");

    let response = app.oneshot(get_request(&uri)).await.unwrap();
    let get = body_json(response).await;
    assert_eq!(get["muscle_groups"], put["muscle_groups"]);
    assert_eq!(get["version"], put["version"]);
}

#[tokio::test]
async fn test_overlong_name_is_bad_request() {
    let (app, events) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/exercises",
            None,
            json!({ "name": "x".repeat(101), "exercise_type": "Cardio" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("name exceeds 100"));
    assert!(events.dispatched().await.is_empty());
}

#[tokio::test]
async fn test_get_unknown_and_malformed_ids() {
    let (app, _) = setup();

    let response = app
        .clone()
        .oneshot(get_request(&format!("/exercises/{}", common::AggregateId::new())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request("/exercises/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_and_filter_by_creator() {
    let (app, _) = setup();
    create_push_up(&app, Some("coach-7")).await;
    create_push_up(&app, Some("coach-9")).await;

    let response = app.clone().oneshot(get_request("/exercises")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app
        .oneshot(get_request("/exercises?created_by=coach-9"))
        .await
        .unwrap();
    let json = body_json(response).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["created_by"], "coach-9");
}

#[tokio::test]
async fn test_delete_exercise() {
    let (app, _) = setup();
    let created = create_push_up(&app, None).await;
    let uri = format!("/exercises/{}", created["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_and_get_trainer() {
    let (app, events) = setup();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/trainers",
            Some("front-desk"),
            json!({ "first_name": "Ana", "last_name": "Lopez", "email": "ana@gym.example" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["created_by"], "front-desk");

    let uri = format!("/trainers/{}", created["id"].as_str().unwrap());
    let response = app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "ana@gym.example");

    // Trainers raise no domain events
    assert!(events.dispatched().await.is_empty());
}

#[tokio::test]
async fn test_invalid_trainer_email_is_bad_request() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/trainers",
            None,
            json!({ "first_name": "Ana", "last_name": "Lopez", "email": "ana" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    create_push_up(&app, None).await;

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_default_state_serves_requests() {
    let state = api::create_default_state(InMemoryStore::new(), "memory").unwrap();
    let app = api::create_app(state, get_metrics_handle());

    let created = create_push_up(&app, Some("coach-7")).await;
    let uri = format!("/exercises/{}", created["id"].as_str().unwrap());

    let response = app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["created_by"], "coach-7");
}
