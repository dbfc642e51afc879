//! PostgreSQL access
//!
//! Owns the lazily created connection pool. Every call runs in its own
//! transaction with `statement_timeout` set, and is bounded client-side by
//! the command timeout. Nothing in here knows about access modes: callers
//! must pass statements through the guard first.

use std::future::Future;
use std::time::Duration;

use base64::Engine as _;
use futures_util::TryStreamExt;
use serde_json::{json, Map, Value};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::types::Uuid;
use sqlx::{Column, Executor, Postgres, Row, Transaction, TypeInfo};
use tokio::sync::OnceCell;

use crate::config::DatabaseConfig;
use crate::types::{ColumnInfo, DbError, ExecuteOutput, HealthStatus, QueryOutput, TableInfo};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Handle to the database, shared by every tool call
pub struct Database {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    /// Pool, connected on first use
    async fn pool(&self) -> Result<&PgPool, DbError> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<PgPool, DbError> {
        let dsn = self.config.dsn()?;
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(self.config.pool_max)
            .acquire_timeout(Duration::from_secs(self.config.command_timeout_secs))
            .connect(dsn)
            .await?;
        tracing::info!(
            max_connections = self.config.pool_max,
            "Connected to PostgreSQL"
        );
        Ok(pool)
    }

    /// Open a transaction with the per-call settings applied
    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DbError> {
        let mut tx = self.pool().await?.begin().await?;
        let setup = transaction_setup(self.config.statement_timeout_ms);
        (&mut *tx).execute(sqlx::raw_sql(&setup)).await?;
        Ok(tx)
    }

    /// Bound `fut` by the client-side command timeout
    async fn timed<T>(&self, fut: impl Future<Output = Result<T, DbError>>) -> Result<T, DbError> {
        let secs = self.config.command_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| DbError::Timeout(secs))?
    }

    // ========================================================================
    // Caller-supplied SQL
    // ========================================================================

    /// Run a row-returning statement, keeping at most `limit` rows
    /// (default: the configured `max_rows`)
    pub async fn query(
        &self,
        sql: &str,
        params: &[Value],
        limit: Option<i64>,
    ) -> Result<QueryOutput, DbError> {
        let max_rows = match limit {
            Some(n) if n <= 0 => return Err(DbError::InvalidLimit),
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
            None => self.config.max_rows,
        };

        self.timed(self.fetch_rows(sql, params, max_rows)).await
    }

    /// Run a statement for its effect
    ///
    /// Without parameters the simple query protocol is used, so a script of
    /// several statements runs as one call. With parameters the statement is
    /// prepared and must be a single statement.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutput, DbError> {
        self.timed(self.run_statement(sql, params)).await
    }

    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[Value],
        max_rows: usize,
    ) -> Result<QueryOutput, DbError> {
        let mut tx = self.begin().await?;

        let mut columns = Vec::new();
        let mut rows = Vec::new();
        let mut truncated = false;
        {
            let mut stream =
                bind_params(sqlx::query(sql).persistent(false), params).fetch(&mut *tx);
            while let Some(row) = stream.try_next().await? {
                if rows.len() == max_rows {
                    truncated = true;
                    break;
                }
                if rows.is_empty() {
                    columns = column_names(&row);
                }
                rows.push(row_to_json(&row));
            }
        }

        tx.commit().await?;

        Ok(QueryOutput {
            row_count: rows.len(),
            columns,
            rows,
            truncated,
        })
    }

    async fn run_statement(&self, sql: &str, params: &[Value]) -> Result<ExecuteOutput, DbError> {
        let mut tx = self.begin().await?;

        let result = if params.is_empty() {
            (&mut *tx).execute(sqlx::raw_sql(sql)).await?
        } else {
            bind_params(sqlx::query(sql).persistent(false), params)
                .execute(&mut *tx)
                .await?
        };

        tx.commit().await?;

        Ok(ExecuteOutput {
            rows_affected: result.rows_affected(),
        })
    }

    // ========================================================================
    // Catalog helpers
    // ========================================================================

    pub async fn healthcheck(&self) -> Result<HealthStatus, DbError> {
        self.timed(self.fetch_health()).await
    }

    pub async fn list_schemas(&self) -> Result<Vec<String>, DbError> {
        self.timed(self.fetch_schemas()).await
    }

    pub async fn list_tables(&self, schema: &str) -> Result<Vec<TableInfo>, DbError> {
        self.timed(self.fetch_tables(schema)).await
    }

    pub async fn describe_table(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        self.timed(self.fetch_columns(schema, table)).await
    }

    async fn fetch_health(&self) -> Result<HealthStatus, DbError> {
        let mut tx = self.begin().await?;
        let version: String = sqlx::query_scalar("select version()")
            .fetch_one(&mut *tx)
            .await?;
        let database: String = sqlx::query_scalar("select current_database()::text")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(HealthStatus {
            ok: true,
            database,
            version,
        })
    }

    async fn fetch_schemas(&self) -> Result<Vec<String>, DbError> {
        let mut tx = self.begin().await?;
        let schemas: Vec<String> = sqlx::query_scalar(
            "select schema_name::text
             from information_schema.schemata
             order by schema_name",
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(schemas)
    }

    async fn fetch_tables(&self, schema: &str) -> Result<Vec<TableInfo>, DbError> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query(
            "select table_schema::text, table_name::text, table_type::text
             from information_schema.tables
             where table_schema = $1
             order by table_name",
        )
        .bind(schema)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let tables = rows
            .iter()
            .map(|r| {
                Ok(TableInfo {
                    schema: r.try_get(0)?,
                    name: r.try_get(1)?,
                    table_type: r.try_get(2)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(tables)
    }

    async fn fetch_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        let mut tx = self.begin().await?;
        let rows = sqlx::query(
            "select
                 column_name::text,
                 data_type::text,
                 is_nullable::text,
                 column_default::text,
                 ordinal_position::int4
             from information_schema.columns
             where table_schema = $1 and table_name = $2
             order by ordinal_position",
        )
        .bind(schema)
        .bind(table)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let columns = rows
            .iter()
            .map(|r| {
                let nullable: String = r.try_get(2)?;
                Ok(ColumnInfo {
                    name: r.try_get(0)?,
                    data_type: r.try_get(1)?,
                    nullable: nullable == "YES",
                    default: r.try_get(3)?,
                    position: r.try_get(4)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(columns)
    }
}

/// Settings issued at the start of every transaction
///
/// `standard_conforming_strings` is pinned so a session-level change left on
/// a pooled connection cannot make backslashes in `'...'` literals act as
/// escapes, which the policy lexer does not expect.
fn transaction_setup(statement_timeout_ms: u64) -> String {
    format!(
        "SET LOCAL statement_timeout = {}; SET LOCAL standard_conforming_strings = on",
        statement_timeout_ms
    )
}

// ============================================================================
// Parameter binding
// ============================================================================

/// Bind JSON parameters positionally (`$1`, `$2`, ...)
fn bind_params<'q>(mut query: PgQuery<'q>, params: &'q [Value]) -> PgQuery<'q> {
    for value in params {
        query = match value {
            Value::Null => query.bind(Option::<String>::None),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.as_str()),
            Value::Array(_) | Value::Object(_) => query.bind(sqlx::types::Json(value)),
        };
    }
    query
}

// ============================================================================
// Row conversion
// ============================================================================

fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Convert a row to a JSON object keyed by column name
fn row_to_json(row: &PgRow) -> Map<String, Value> {
    row.columns()
        .iter()
        .map(|col| {
            let value = column_value(row, col.ordinal(), col.type_info().name());
            (col.name().to_string(), value)
        })
        .collect()
}

/// Decode a column by its PostgreSQL type name
fn column_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
    match type_name {
        "BOOL" => decode(row, idx, |v: bool| json!(v)),
        "INT2" => decode(row, idx, |v: i16| json!(v)),
        "INT4" => decode(row, idx, |v: i32| json!(v)),
        "INT8" => decode(row, idx, |v: i64| json!(v)),
        "FLOAT4" => decode(row, idx, |v: f32| json!(v)),
        "FLOAT8" => decode(row, idx, |v: f64| json!(v)),
        "NUMERIC" => decode(row, idx, |v: rust_decimal::Decimal| json!(v.to_string())),
        "OID" => decode(row, idx, |v: sqlx::postgres::types::Oid| json!(v.0)),
        "JSON" | "JSONB" => decode(row, idx, |v: Value| v),
        "BYTEA" => decode(row, idx, |v: Vec<u8>| bytes_to_json(&v)),
        "TIMESTAMPTZ" => decode(row, idx, |v: chrono::DateTime<chrono::Utc>| {
            json!(v.to_rfc3339())
        }),
        "TIMESTAMP" => decode(row, idx, |v: chrono::NaiveDateTime| {
            json!(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        "DATE" => decode(row, idx, |v: chrono::NaiveDate| json!(v.to_string())),
        "TIME" => decode(row, idx, |v: chrono::NaiveTime| json!(v.to_string())),
        "INTERVAL" => decode(row, idx, |v: PgInterval| json!(interval_to_iso8601(&v))),
        "UUID" => decode(row, idx, |v: Uuid| json!(v.to_string())),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => {
            decode(row, idx, |v: String| json!(v))
        }
        "BOOL[]" => decode(row, idx, |v: Vec<Option<bool>>| json!(v)),
        "INT2[]" => decode(row, idx, |v: Vec<Option<i16>>| json!(v)),
        "INT4[]" => decode(row, idx, |v: Vec<Option<i32>>| json!(v)),
        "INT8[]" => decode(row, idx, |v: Vec<Option<i64>>| json!(v)),
        "FLOAT4[]" => decode(row, idx, |v: Vec<Option<f32>>| json!(v)),
        "FLOAT8[]" => decode(row, idx, |v: Vec<Option<f64>>| json!(v)),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            decode(row, idx, |v: Vec<Option<String>>| json!(v))
        }
        "UUID[]" => decode(row, idx, |v: Vec<Option<Uuid>>| {
            json!(v
                .iter()
                .map(|u| u.map(|u| u.to_string()))
                .collect::<Vec<_>>())
        }),
        other => match row.try_get::<Option<String>, _>(idx) {
            Ok(Some(v)) => json!(v),
            Ok(None) => Value::Null,
            Err(_) => json!(format!("<unsupported {}>", other.to_lowercase())),
        },
    }
}

fn decode<'r, T>(row: &'r PgRow, idx: usize, to_json: impl FnOnce(T) -> Value) -> Value
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => to_json(v),
        Ok(None) => Value::Null,
        Err(e) => {
            tracing::debug!("Failed to decode column {}: {}", idx, e);
            Value::Null
        }
    }
}

/// ISO 8601 duration, e.g. `P1M2DT3.5S`
fn interval_to_iso8601(v: &PgInterval) -> String {
    let whole = v.microseconds / 1_000_000;
    let frac = (v.microseconds % 1_000_000).unsigned_abs();
    let sign = if v.microseconds < 0 && whole == 0 { "-" } else { "" };

    let seconds = if frac == 0 {
        format!("{}{}", sign, whole)
    } else {
        let digits = format!("{:06}", frac);
        format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    };

    format!("P{}M{}DT{}S", v.months, v.days, seconds)
}

/// Binary values are tagged so callers can tell them from text
fn bytes_to_json(bytes: &[u8]) -> Value {
    json!({
        "__type": "bytes_b64",
        "data": base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}
