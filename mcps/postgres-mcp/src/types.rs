//! Type definitions for postgres MCP

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Access Control Types
// ============================================================================

/// Access tier bounding which SQL the server will run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// SELECT / WITH / EXPLAIN only, `pg_execute` disabled
    #[default]
    ReadOnly,
    /// Writes allowed, but no DROP/TRUNCATE/GRANT/REVOKE/ALTER SYSTEM and
    /// UPDATE/DELETE need a WHERE clause
    Limited,
    /// No policy checks at all
    Unrestricted,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "readonly",
            AccessMode::Limited => "limited",
            AccessMode::Unrestricted => "unrestricted",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "readonly" | "read-only" | "read_only" => Ok(AccessMode::ReadOnly),
            "limited" => Ok(AccessMode::Limited),
            "unrestricted" => Ok(AccessMode::Unrestricted),
            _ => Err(ConfigError::UnknownAccessMode(s.to_string())),
        }
    }
}

/// Which tool surface a statement arrived through
///
/// Independent of the SQL verb: a `SELECT` sent through `pg_execute` is
/// still an `Execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationCategory {
    Query,
    Execute,
}

impl fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationCategory::Query => f.write_str("query"),
            OperationCategory::Execute => f.write_str("execute"),
        }
    }
}

/// Outcome of a single policy check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny(PolicyViolation),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }

    /// Turn the decision into a `Result` so denial has to be handled with `?`
    pub fn into_result(self) -> Result<(), PolicyViolation> {
        match self {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(violation) => Err(violation),
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Reason a statement was refused before reaching the database
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("pg_execute is not available in readonly access mode")]
    ToolForbidden,

    #[error("statement type is not permitted in the current access mode")]
    StatementTypeForbidden,

    #[error("multiple statements are not permitted; send one statement per call")]
    MultipleStatementsForbidden,

    #[error("UPDATE and DELETE require a WHERE clause in limited access mode")]
    MissingWhereClause,

    #[error("access mode is not recognized by the policy classifier")]
    UnknownAccessMode,
}

/// Startup configuration failures; these abort the server
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown access mode '{0}' (expected readonly, limited or unrestricted)")]
    UnknownAccessMode(String),

    #[error(
        "missing database config: set DATABASE_URL (or DATABASE_URI), \
         or PGHOST/PGDATABASE/PGUSER (PGPASSWORD/PGPORT optional)"
    )]
    MissingDatabase,

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures while talking to PostgreSQL
#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("limit must be > 0")]
    InvalidLimit,

    #[error("command timed out after {0}s")]
    Timeout(u64),
}

// ============================================================================
// Response Types
// ============================================================================

/// Result of `pg_healthcheck`
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub database: String,
    pub version: String,
}

/// One entry of `pg_list_tables`
#[derive(Debug, Serialize, Deserialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: String,
}

/// One column of `pg_describe_table`
#[derive(Debug, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub position: i32,
}

/// Rows returned by `pg_query`
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

/// Outcome of `pg_execute`
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteOutput {
    pub rows_affected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_parse() {
        assert_eq!("readonly".parse::<AccessMode>().unwrap(), AccessMode::ReadOnly);
        assert_eq!(" Read-Only ".parse::<AccessMode>().unwrap(), AccessMode::ReadOnly);
        assert_eq!("LIMITED".parse::<AccessMode>().unwrap(), AccessMode::Limited);
        assert_eq!(
            "unrestricted".parse::<AccessMode>().unwrap(),
            AccessMode::Unrestricted
        );
    }

    #[test]
    fn test_unknown_access_mode_is_config_error() {
        let err = "admin".parse::<AccessMode>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAccessMode(ref s) if s == "admin"));
        assert!("".parse::<AccessMode>().is_err());
    }

    #[test]
    fn test_default_mode_is_readonly() {
        assert_eq!(AccessMode::default(), AccessMode::ReadOnly);
    }

    #[test]
    fn test_decision_into_result() {
        assert!(PolicyDecision::Allow.into_result().is_ok());
        assert_eq!(
            PolicyDecision::Deny(PolicyViolation::ToolForbidden).into_result(),
            Err(PolicyViolation::ToolForbidden)
        );
    }
}
