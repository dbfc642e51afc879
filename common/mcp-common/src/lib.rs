//! MCP Common - Shared utilities for MCP servers
//!
//! - **Initialization**: `serve_stdio!` macro and [`init_tracing`]
//! - **Results**: [`json_success`] for tool responses
//! - **Errors**: [`IntoMcpError`] / [`ResultExt`] for converting domain errors
//!
//! ```rust,ignore
//! // main.rs
//! mcp_common::serve_stdio!(MyServer::from_cli, "my_mcp");
//!
//! // tool implementation
//! fn my_tool(&self) -> Result<CallToolResult, McpError> {
//!     let data = load().to_mcp_err()?;
//!     json_success(&data)
//! }
//! ```

pub mod error;
pub mod init;
pub mod result;

pub use error::{internal_error, invalid_params, invalid_request, IntoMcpError, McpResult, ResultExt};
pub use init::init_tracing;
pub use result::json_success;

// Re-export rmcp types that are commonly needed
pub use rmcp::{model::CallToolResult, ErrorData as McpError};
