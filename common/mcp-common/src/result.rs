//! Result helpers for MCP tool responses

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::{McpResult, ResultExt};

/// Pretty-printed JSON of `data` as a successful tool result
pub fn json_success<T: Serialize>(data: &T) -> McpResult<CallToolResult> {
    let json = serde_json::to_string_pretty(data).to_mcp_err()?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
