//! Read-only database connector.
//!
//! The only safety measure is a textual allow-list: the query, trimmed and
//! lower-cased, must start with `select`. There is no parameter binding
//! and no real sandbox behind it (a `select` can still call functions with
//! side effects). Point sources at a read-only role.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;

use cockpit_core::config::DatabaseConfig;
use cockpit_core::{SourceData, SourceError};

use crate::plan::DatabasePlan;

/// Executes a textual query and returns one JSON object per row.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, connection: &str, query: &str) -> Result<Vec<Value>, SourceError>;
}

/// Reject anything that is not a `SELECT`.
pub fn check_select_only(query: &str) -> Result<(), SourceError> {
    if query.trim().to_lowercase().starts_with("select") {
        Ok(())
    } else {
        Err(SourceError::Policy(
            "seules les requêtes SELECT sont autorisées (lecture seule)".into(),
        ))
    }
}

pub async fn run_query(
    executor: &dyn SqlExecutor,
    plan: &DatabasePlan,
) -> Result<Option<SourceData>, SourceError> {
    check_select_only(&plan.query)?;
    let rows = executor.execute(&plan.connection, plan.query.trim()).await?;
    debug!(rows = rows.len(), "database query completed");
    Ok(Some(SourceData::Records(rows)))
}

// ── PostgreSQL ────────────────────────────────────────────────

/// [`SqlExecutor`] over a short-lived sqlx Postgres pool per call. The
/// connection string comes from the source descriptor.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    max_connections: u32,
    connect_timeout: Duration,
}

impl PgExecutor {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections.max(1),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute(&self, connection: &str, query: &str) -> Result<Vec<Value>, SourceError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .connect(connection)
            .await
            .map_err(|e| SourceError::Database(format!("connexion impossible: {e}")))?;

        let result = sqlx::query(query).fetch_all(&pool).await;
        pool.close().await;

        let rows = result.map_err(|e| SourceError::Database(e.to_string()))?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Convert a row to a JSON object by column type. Types without a JSON
/// mapping (and SQL NULLs) become `null`.
fn row_to_json(row: &PgRow) -> Value {
    let mut obj = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let i = column.ordinal();
        let value = match column.type_info().name() {
            "BOOL" => decode::<bool>(row, i).map(Value::from),
            "INT2" => decode::<i16>(row, i).map(Value::from),
            "INT4" => decode::<i32>(row, i).map(Value::from),
            "INT8" => decode::<i64>(row, i).map(Value::from),
            "FLOAT4" => decode::<f32>(row, i).map(|v| Value::from(f64::from(v))),
            "FLOAT8" => decode::<f64>(row, i).map(Value::from),
            "JSON" | "JSONB" => decode::<Value>(row, i),
            "UUID" => decode::<uuid::Uuid>(row, i).map(|v| Value::from(v.to_string())),
            "TIMESTAMPTZ" => decode::<chrono::DateTime<chrono::Utc>>(row, i)
                .map(|v| Value::from(v.to_rfc3339())),
            "TIMESTAMP" => decode::<chrono::NaiveDateTime>(row, i).map(|v| Value::from(v.to_string())),
            "DATE" => decode::<chrono::NaiveDate>(row, i).map(|v| Value::from(v.to_string())),
            _ => decode::<String>(row, i).map(Value::from),
        };
        obj.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }
    Value::Object(obj)
}

fn decode<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        queries: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SqlExecutor for RecordingExecutor {
        async fn execute(&self, connection: &str, query: &str) -> Result<Vec<Value>, SourceError> {
            self.queries
                .lock()
                .unwrap()
                .push((connection.to_string(), query.to_string()));
            Ok(vec![json!({"id": 1}), json!({"id": 2})])
        }
    }

    fn plan(query: &str) -> DatabasePlan {
        DatabasePlan {
            connection: "postgres://ro@db/metrics".into(),
            query: query.into(),
        }
    }

    #[test]
    fn test_select_only_policy() {
        assert!(check_select_only("select * from t").is_ok());
        assert!(check_select_only("  SELECT count(*) FROM incidents").is_ok());
        assert!(check_select_only("DROP TABLE users").is_err());
        assert!(check_select_only("update t set a = 1").is_err());
        assert!(check_select_only("").is_err());
    }

    #[test]
    fn test_policy_message_names_restriction() {
        let err = check_select_only("DELETE FROM t").unwrap_err();
        assert!(matches!(err, SourceError::Policy(_)));
        assert!(err.to_string().contains("SELECT"));
    }

    #[tokio::test]
    async fn test_run_query_executes_select() {
        let executor = RecordingExecutor::default();
        let data = run_query(&executor, &plan("  select id from t ")).await.unwrap();
        assert_eq!(data.unwrap().record_count(), 2);

        let queries = executor.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].0, "postgres://ro@db/metrics");
        assert_eq!(queries[0].1, "select id from t");
    }

    #[tokio::test]
    async fn test_run_query_never_reaches_executor_on_violation() {
        let executor = RecordingExecutor::default();
        let err = run_query(&executor, &plan("DROP TABLE users")).await.unwrap_err();
        assert!(matches!(err, SourceError::Policy(_)));
        assert!(executor.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pg_executor_floor_on_pool_size() {
        let executor = PgExecutor::new(&DatabaseConfig {
            max_connections: 0,
            connect_timeout_secs: 5,
        });
        assert_eq!(executor.max_connections, 1);
        assert_eq!(executor.connect_timeout, Duration::from_secs(5));
    }
}
