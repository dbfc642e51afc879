//! Tool handlers
//!
//! Handlers for caller-supplied SQL check the statement through the guard
//! first; only an allowed statement is handed to the database, unchanged and
//! with its original parameters.

use mcp_common::{
    internal_error, invalid_params, invalid_request, json_success, CallToolResult, IntoMcpError,
    McpError, ResultExt,
};

use crate::db::Database;
use crate::guard::SqlGuard;
use crate::params::*;
use crate::types::{DbError, OperationCategory, PolicyViolation};

// ============================================================================
// Error Mapping
// ============================================================================

impl IntoMcpError for PolicyViolation {
    fn into_mcp_error(self) -> McpError {
        invalid_request(format!("permission denied: {}", self))
    }
}

impl IntoMcpError for DbError {
    fn into_mcp_error(self) -> McpError {
        match &self {
            DbError::InvalidLimit => invalid_params(self.to_string()),
            DbError::Config(_) | DbError::Sqlx(_) | DbError::Timeout(_) => {
                tracing::error!("{}", self);
                internal_error(self.to_string())
            }
        }
    }
}

// ============================================================================
// Handler Functions
// ============================================================================

pub async fn pg_query(
    guard: &SqlGuard,
    db: &Database,
    params: QueryParams,
) -> Result<CallToolResult, McpError> {
    guard
        .check_sql(&params.sql, OperationCategory::Query)
        .to_mcp_err()?;

    let bound = params.params.unwrap_or_default();
    let output = db
        .query(&params.sql, &bound, params.limit)
        .await
        .to_mcp_err()?;

    json_success(&output)
}

pub async fn pg_execute(
    guard: &SqlGuard,
    db: &Database,
    params: ExecuteParams,
) -> Result<CallToolResult, McpError> {
    guard
        .check_sql(&params.sql, OperationCategory::Execute)
        .to_mcp_err()?;

    let bound = params.params.unwrap_or_default();
    let output = db.execute(&params.sql, &bound).await.to_mcp_err()?;

    json_success(&output)
}

pub async fn pg_healthcheck(db: &Database) -> Result<CallToolResult, McpError> {
    let health = db.healthcheck().await.to_mcp_err()?;
    json_success(&health)
}

pub async fn pg_list_schemas(db: &Database) -> Result<CallToolResult, McpError> {
    let schemas = db.list_schemas().await.to_mcp_err()?;
    json_success(&schemas)
}

pub async fn pg_list_tables(
    db: &Database,
    params: ListTablesParams,
) -> Result<CallToolResult, McpError> {
    let tables = db.list_tables(&params.schema).await.to_mcp_err()?;
    json_success(&tables)
}

pub async fn pg_describe_table(
    db: &Database,
    params: DescribeTableParams,
) -> Result<CallToolResult, McpError> {
    let columns = db
        .describe_table(&params.schema, &params.table)
        .await
        .to_mcp_err()?;
    json_success(&columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::types::AccessMode;

    fn offline_db() -> Database {
        Database::new(DatabaseConfig::default())
    }

    #[tokio::test]
    async fn test_denied_query_never_reaches_database() {
        // No DSN configured: reaching the database would surface a config
        // error instead of the policy error.
        let guard = SqlGuard::new(AccessMode::ReadOnly);
        let params = QueryParams {
            sql: "DELETE FROM users".into(),
            params: None,
            limit: None,
        };

        let err = pg_query(&guard, &offline_db(), params).await.unwrap_err();
        assert!(err.message.contains("permission denied"));
    }

    #[tokio::test]
    async fn test_execute_forbidden_in_readonly() {
        let guard = SqlGuard::new(AccessMode::ReadOnly);
        let params = ExecuteParams {
            sql: "SELECT 1".into(),
            params: None,
        };

        let err = pg_execute(&guard, &offline_db(), params).await.unwrap_err();
        assert!(err.message.contains("pg_execute is not available"));
    }

    #[tokio::test]
    async fn test_allowed_query_goes_to_database() {
        let guard = SqlGuard::new(AccessMode::ReadOnly);
        let params = QueryParams {
            sql: "SELECT 1".into(),
            params: None,
            limit: None,
        };

        let err = pg_query(&guard, &offline_db(), params).await.unwrap_err();
        assert!(err.message.contains("missing database config"));
    }

    #[tokio::test]
    async fn test_invalid_limit_is_invalid_params() {
        let guard = SqlGuard::new(AccessMode::ReadOnly);
        let params = QueryParams {
            sql: "SELECT 1".into(),
            params: None,
            limit: Some(-1),
        };

        let err = pg_query(&guard, &offline_db(), params).await.unwrap_err();
        assert!(err.message.contains("limit must be > 0"));
    }
}
