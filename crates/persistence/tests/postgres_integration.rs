//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p persistence --test postgres_integration -- --test-threads=1
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use persistence::{
    AggregateId, AuditMetadata, ChangeSet, ColumnKind, ColumnSchema, ColumnValue,
    PersistenceError, PostgresStore, Record, RecordQuery, RecordStore, RecordWrite, TableSchema,
    Version,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(pool.clone())
                .run_migrations()
                .await
                .unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE exercises, trainers")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn column(name: &'static str, kind: ColumnKind) -> ColumnSchema {
    ColumnSchema {
        name,
        kind,
        required: false,
        max_length: None,
    }
}

fn exercises() -> TableSchema {
    TableSchema {
        table: "exercises",
        columns: vec![
            column("name", ColumnKind::Text),
            column("description", ColumnKind::Text),
            column("exercise_type", ColumnKind::Text),
            column("muscle_groups", ColumnKind::Text),
        ],
    }
}

fn exercise(id: AggregateId, version: Version, name: &str, by: Option<&str>) -> Record {
    let now = Utc::now();
    let columns: BTreeMap<String, ColumnValue> = [
        ("name".to_string(), ColumnValue::Text(name.into())),
        ("description".to_string(), ColumnValue::Null),
        ("exercise_type".to_string(), ColumnValue::Text("Strength".into())),
        (
            "muscle_groups".to_string(),
            ColumnValue::Text(r#"["Chest","Triceps"]"#.into()),
        ),
    ]
    .into();

    Record {
        table: "exercises".into(),
        id,
        version,
        audit: audit(now, by),
        columns,
    }
}

/// Audit columns as a previous save would have stamped them.
fn audit(at: chrono::DateTime<Utc>, by: Option<&str>) -> AuditMetadata {
    serde_json::from_value(serde_json::json!({
        "created_at": at,
        "created_by": by,
        "modified_at": at,
        "modified_by": by,
    }))
    .unwrap()
}

fn single(write: RecordWrite) -> ChangeSet {
    std::iter::once(write).collect()
}

#[tokio::test]
#[serial]
async fn insert_and_fetch_round_trips() {
    let store = get_test_store().await;
    let id = AggregateId::new();
    let record = exercise(id, Version::first(), "Push Up", Some("coach"));

    let affected = store
        .commit(single(RecordWrite::Insert(record.clone())))
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let loaded = store.fetch(&exercises(), id).await.unwrap().unwrap();
    assert_eq!(loaded.version, Version::first());
    assert_eq!(loaded.columns, record.columns);
    assert_eq!(loaded.audit.created_by(), Some("coach"));
    assert_eq!(loaded.column("description"), Some(&ColumnValue::Null));
}

#[tokio::test]
#[serial]
async fn duplicate_insert_is_a_duplicate_key() {
    let store = get_test_store().await;
    let id = AggregateId::new();
    store
        .commit(single(RecordWrite::Insert(exercise(
            id,
            Version::first(),
            "Squat",
            None,
        ))))
        .await
        .unwrap();

    let err = store
        .commit(single(RecordWrite::Insert(exercise(
            id,
            Version::first(),
            "Squat",
            None,
        ))))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::DuplicateKey { .. }));
}

#[tokio::test]
#[serial]
async fn stale_update_is_a_conflict_and_rolls_back() {
    let store = get_test_store().await;
    let id = AggregateId::new();
    store
        .commit(single(RecordWrite::Insert(exercise(
            id,
            Version::first(),
            "Squat",
            None,
        ))))
        .await
        .unwrap();
    store
        .commit(single(RecordWrite::Update {
            record: exercise(id, Version::new(2), "Back Squat", None),
            expected_version: Version::first(),
        }))
        .await
        .unwrap();

    let other = AggregateId::new();
    let changes: ChangeSet = vec![
        RecordWrite::Insert(exercise(other, Version::first(), "Lunge", None)),
        RecordWrite::Update {
            record: exercise(id, Version::new(2), "Front Squat", None),
            expected_version: Version::first(),
        },
    ]
    .into_iter()
    .collect();

    let err = store.commit(changes).await.unwrap_err();
    match err {
        PersistenceError::ConcurrencyConflict {
            expected, actual, ..
        } => {
            assert_eq!(expected, Version::first());
            assert_eq!(actual, Some(Version::new(2)));
        }
        other => panic!("unexpected error: {other}"),
    }

    // The insert in the failed batch was rolled back
    assert!(store.fetch(&exercises(), other).await.unwrap().is_none());
    assert_eq!(store.count(&exercises()).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn delete_of_missing_row_reports_no_row() {
    let store = get_test_store().await;
    let err = store
        .commit(single(RecordWrite::Delete {
            table: "exercises".into(),
            id: AggregateId::new(),
            expected_version: Version::first(),
        }))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PersistenceError::ConcurrencyConflict { actual: None, .. }
    ));
}

#[tokio::test]
#[serial]
async fn query_filters_and_pages() {
    let store = get_test_store().await;
    let start = Utc::now() - Duration::seconds(1);

    for (name, by) in [("Row", Some("alice")), ("Plank", Some("bob")), ("Dip", Some("alice"))] {
        store
            .commit(single(RecordWrite::Insert(exercise(
                AggregateId::new(),
                Version::first(),
                name,
                by,
            ))))
            .await
            .unwrap();
    }

    let alice = store
        .query(&exercises(), &RecordQuery::new().created_by("alice"))
        .await
        .unwrap();
    assert_eq!(alice.len(), 2);

    let page = store
        .query(
            &exercises(),
            &RecordQuery::new().created_after(start).limit(2),
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    assert_eq!(store.fetch_all(&exercises()).await.unwrap().len(), 3);
}
