//! Postgres MCP Server
//!
//! Provides PostgreSQL query tools over stdio.
//! Readonly by default, wider access via `--access-mode` or `PG_ACCESS_MODE`.

use postgres_mcp::PostgresMcpServer;

mcp_common::serve_stdio!(PostgresMcpServer::from_cli, "postgres_mcp");
