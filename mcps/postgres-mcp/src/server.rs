//! MCP Server implementation for PostgreSQL
//!
//! This module defines the main MCP server that exposes the database as tools.
//! Handler implementations are in the handlers module.

use std::sync::Arc;

use clap::Parser;
use mcp_common::{CallToolResult, McpError};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::config::{Cli, Config};
use crate::db::Database;
use crate::guard::SqlGuard;
use crate::handlers;
use crate::params::*;
use crate::types::AccessMode;

/// The Postgres MCP Server
#[derive(Clone)]
pub struct PostgresMcpServer {
    guard: SqlGuard,
    db: Arc<Database>,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl PostgresMcpServer {
    /// Create a server from command line arguments and the environment
    ///
    /// An unknown access mode or a malformed setting is a startup error.
    pub fn from_cli() -> anyhow::Result<Self> {
        let cli = Cli::parse();
        let config = Config::load(&cli)?;
        Ok(Self::with_config(config))
    }

    /// Create a new server with explicit config
    pub fn with_config(config: Config) -> Self {
        tracing::info!(access_mode = %config.access_mode, "Access mode resolved");

        Self {
            guard: SqlGuard::new(config.access_mode),
            db: Arc::new(Database::new(config.database)),
            tool_router: Self::tool_router(),
        }
    }

    pub fn access_mode(&self) -> AccessMode {
        self.guard.mode()
    }

    #[tool(description = "Check the database connection and report the server version")]
    async fn pg_healthcheck(&self) -> Result<CallToolResult, McpError> {
        handlers::pg_healthcheck(&self.db).await
    }

    #[tool(description = "List schemas in the database")]
    async fn pg_list_schemas(&self) -> Result<CallToolResult, McpError> {
        handlers::pg_list_schemas(&self.db).await
    }

    #[tool(description = "List tables and views in a schema (default: public)")]
    async fn pg_list_tables(
        &self,
        Parameters(params): Parameters<ListTablesParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::pg_list_tables(&self.db, params).await
    }

    #[tool(description = "Describe a table's columns: type, nullability, default and position")]
    async fn pg_describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::pg_describe_table(&self.db, params).await
    }

    #[tool(
        description = "Run a SQL query and return rows as JSON (row cap applies). \
                       The statement is checked against the server's access mode first."
    )]
    async fn pg_query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::pg_query(&self.guard, &self.db, params).await
    }

    #[tool(
        description = "Execute a SQL statement (INSERT/UPDATE/DDL, ...). \
                       Not available in readonly mode; limited mode blocks DROP, TRUNCATE, \
                       GRANT, REVOKE, ALTER SYSTEM and UPDATE/DELETE without WHERE."
    )]
    async fn pg_execute(
        &self,
        Parameters(params): Parameters<ExecuteParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::pg_execute(&self.guard, &self.db, params).await
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for PostgresMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "PostgreSQL MCP server. Currently in {} access mode. \
                 Use pg_list_schemas, pg_list_tables and pg_describe_table to explore, \
                 pg_query to read and pg_execute to write.",
                self.guard.mode()
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
