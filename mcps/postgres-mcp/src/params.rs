//! Parameter types for Postgres MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "SQL to run; rows are returned as JSON objects")]
    pub sql: String,

    #[schemars(description = "Positional parameters bound to $1, $2, ... (optional)")]
    #[serde(default)]
    pub params: Option<Vec<Value>>,

    #[schemars(description = "Maximum rows to return (optional, defaults to the server's row cap)")]
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteParams {
    #[schemars(description = "SQL statement to execute (INSERT/UPDATE/DDL, ...)")]
    pub sql: String,

    #[schemars(description = "Positional parameters bound to $1, $2, ... (optional)")]
    #[serde(default)]
    pub params: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListTablesParams {
    #[schemars(description = "Schema to list (default: public)")]
    #[serde(default = "default_schema")]
    pub schema: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DescribeTableParams {
    #[schemars(description = "Schema containing the table")]
    pub schema: String,

    #[schemars(description = "Table or view name")]
    pub table: String,
}

fn default_schema() -> String {
    "public".to_string()
}
