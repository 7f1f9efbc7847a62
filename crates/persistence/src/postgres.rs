use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, PgPool, Postgres, Row};
use uuid::Uuid;

use crate::column::{ColumnKind, ColumnValue};
use crate::entity::{RESERVED_COLUMNS, TableSchema};
use crate::query::RecordQuery;
use crate::record::{AuditMetadata, ChangeSet, Record, RecordWrite};
use crate::store::{RecordStore, validate_change_set};
use crate::{AggregateId, PersistenceError, Result, Version};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed record store implementation.
///
/// Statements are built from the [`TableSchema`] of each entity type, so
/// every aggregate table shares the same id, version and audit columns.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL record store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn apply(conn: &mut PgConnection, write: &RecordWrite) -> Result<()> {
        match write {
            RecordWrite::Insert(record) => {
                let sql = insert_sql(record);
                let query = bind_audit(sqlx::query(&sql).bind(record.id.as_uuid()), record)
                    .bind(record.version.as_i64());
                bind_columns(query, record)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        if let sqlx::Error::Database(ref db_err) = e
                            && db_err.is_unique_violation()
                        {
                            return PersistenceError::DuplicateKey {
                                table: record.table.clone(),
                                id: record.id,
                            };
                        }
                        e.into()
                    })?;
                Ok(())
            }
            RecordWrite::Update {
                record,
                expected_version,
            } => {
                let sql = update_sql(record);
                let query = bind_audit(sqlx::query(&sql).bind(record.id.as_uuid()), record)
                    .bind(record.version.as_i64())
                    .bind(expected_version.as_i64());
                let result = bind_columns(query, record).execute(&mut *conn).await?;
                if result.rows_affected() == 0 {
                    return Err(Self::conflict(conn, write, *expected_version).await);
                }
                Ok(())
            }
            RecordWrite::Delete {
                table,
                id,
                expected_version,
            } => {
                let sql = format!(
                    "DELETE FROM {} WHERE id = $1 AND version = $2",
                    quote(table)
                );
                let result = sqlx::query(&sql)
                    .bind(id.as_uuid())
                    .bind(expected_version.as_i64())
                    .execute(&mut *conn)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(Self::conflict(conn, write, *expected_version).await);
                }
                Ok(())
            }
        }
    }

    /// Builds the conflict error for a guarded write that matched no row.
    async fn conflict(
        conn: &mut PgConnection,
        write: &RecordWrite,
        expected: Version,
    ) -> PersistenceError {
        let sql = format!("SELECT version FROM {} WHERE id = $1", quote(write.table()));
        let actual: Option<i64> = match sqlx::query_scalar(&sql)
            .bind(write.id().as_uuid())
            .fetch_optional(&mut *conn)
            .await
        {
            Ok(actual) => actual,
            Err(e) => return e.into(),
        };

        PersistenceError::ConcurrencyConflict {
            table: write.table().to_string(),
            id: write.id(),
            expected,
            actual: actual.map(Version::new),
        }
    }

    fn row_to_record(schema: &TableSchema, row: PgRow) -> Result<Record> {
        let audit = AuditMetadata::restore(
            row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
            row.try_get::<Option<String>, _>("created_by")?,
            row.try_get::<Option<DateTime<Utc>>, _>("modified_at")?,
            row.try_get::<Option<String>, _>("modified_by")?,
        );

        let mut columns = BTreeMap::new();
        for column in &schema.columns {
            let value = decode_column(&row, column.name, column.kind)?;
            columns.insert(column.name.to_string(), value);
        }

        Ok(Record {
            table: schema.table.to_string(),
            id: AggregateId::from_uuid(row.try_get::<Uuid, _>("id")?),
            version: Version::new(row.try_get("version")?),
            audit,
            columns,
        })
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    #[tracing::instrument(skip(self, changes), fields(writes = changes.len()))]
    async fn commit(&self, changes: ChangeSet) -> Result<usize> {
        validate_change_set(&changes)?;
        if changes.is_empty() {
            return Ok(0);
        }

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        for write in changes.iter() {
            Self::apply(&mut tx, write).await?;
        }
        tx.commit().await?;

        Ok(changes.len())
    }

    async fn fetch(&self, schema: &TableSchema, id: AggregateId) -> Result<Option<Record>> {
        let sql = format!("{} WHERE id = $1", select_sql(schema));
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::row_to_record(schema, row)).transpose()
    }

    async fn fetch_all(&self, schema: &TableSchema) -> Result<Vec<Record>> {
        self.query(schema, &RecordQuery::new()).await
    }

    async fn query(&self, schema: &TableSchema, query: &RecordQuery) -> Result<Vec<Record>> {
        let mut sql = format!("{} WHERE 1=1", select_sql(schema));
        let mut param_count = 0;

        // Build dynamic query
        if query.created_by.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_by = ${param_count}"));
        }
        if query.created_after.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at >= ${param_count}"));
        }
        if query.created_before.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND created_at <= ${param_count}"));
        }
        if query.modified_after.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND modified_at >= ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at ASC NULLS FIRST, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(ref actor) = query.created_by {
            sqlx_query = sqlx_query.bind(actor.clone());
        }
        if let Some(after) = query.created_after {
            sqlx_query = sqlx_query.bind(after);
        }
        if let Some(before) = query.created_before {
            sqlx_query = sqlx_query.bind(before);
        }
        if let Some(after) = query.modified_after {
            sqlx_query = sqlx_query.bind(after);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| Self::row_to_record(schema, row))
            .collect()
    }

    async fn count(&self, schema: &TableSchema) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(schema.table));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn select_sql(schema: &TableSchema) -> String {
    let columns = RESERVED_COLUMNS
        .iter()
        .copied()
        .chain(schema.columns.iter().map(|c| c.name))
        .map(quote)
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {}", quote(schema.table))
}

/// SQL text for a mapped value. `NULL` is written as a literal so it needs
/// no parameter type.
fn value_sql(value: &ColumnValue, param_count: &mut usize) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    *param_count += 1;
    format!("${param_count}")
}

// $1 id, $2..$5 audit, $6 version, then mapped columns
fn insert_sql(record: &Record) -> String {
    let mut names: Vec<String> = RESERVED_COLUMNS.iter().map(|c| quote(c)).collect();
    let mut values: Vec<String> = vec!["$1", "$6", "$2", "$3", "$4", "$5"]
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut param_count = 6;
    for (name, value) in &record.columns {
        names.push(quote(name));
        values.push(value_sql(value, &mut param_count));
    }

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(&record.table),
        names.join(", "),
        values.join(", ")
    )
}

// $1 id, $2..$5 audit, $6 new version, $7 expected version, then mapped columns
fn update_sql(record: &Record) -> String {
    let mut assignments = vec![
        "version = $6".to_string(),
        "created_at = $2".to_string(),
        "created_by = $3".to_string(),
        "modified_at = $4".to_string(),
        "modified_by = $5".to_string(),
    ];

    let mut param_count = 7;
    for (name, value) in &record.columns {
        assignments.push(format!("{} = {}", quote(name), value_sql(value, &mut param_count)));
    }

    format!(
        "UPDATE {} SET {} WHERE id = $1 AND version = $7",
        quote(&record.table),
        assignments.join(", ")
    )
}

fn bind_audit<'q>(query: PgQuery<'q>, record: &Record) -> PgQuery<'q> {
    query
        .bind(record.audit.created_at())
        .bind(record.audit.created_by().map(str::to_string))
        .bind(record.audit.modified_at())
        .bind(record.audit.modified_by().map(str::to_string))
}

/// Binds mapped columns in the same order `insert_sql`/`update_sql` number them.
fn bind_columns<'q>(mut query: PgQuery<'q>, record: &Record) -> PgQuery<'q> {
    for value in record.columns.values() {
        query = match value {
            ColumnValue::Null => query,
            ColumnValue::Text(text) => query.bind(text.clone()),
            ColumnValue::Integer(n) => query.bind(*n),
            ColumnValue::Boolean(b) => query.bind(*b),
            ColumnValue::Uuid(uuid) => query.bind(*uuid),
            ColumnValue::Timestamp(at) => query.bind(*at),
        };
    }
    query
}

fn decode_column(row: &PgRow, name: &str, kind: ColumnKind) -> Result<ColumnValue> {
    let value = match kind {
        ColumnKind::Text => row
            .try_get::<Option<String>, _>(name)?
            .map(ColumnValue::Text),
        ColumnKind::Integer => row
            .try_get::<Option<i64>, _>(name)?
            .map(ColumnValue::Integer),
        ColumnKind::Boolean => row
            .try_get::<Option<bool>, _>(name)?
            .map(ColumnValue::Boolean),
        ColumnKind::Uuid => row.try_get::<Option<Uuid>, _>(name)?.map(ColumnValue::Uuid),
        ColumnKind::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(name)?
            .map(ColumnValue::Timestamp),
    };
    Ok(value.unwrap_or(ColumnValue::Null))
}
