//! Postgres MCP Library
//!
//! PostgreSQL tools for MCP with an access-mode policy engine.
//! Readonly by default; `limited` and `unrestricted` widen what SQL may run.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use postgres_mcp::{policy, AccessMode, OperationCategory};
//!
//! let decision = policy::evaluate("SELECT 1", AccessMode::ReadOnly, OperationCategory::Query);
//! assert!(decision.is_allowed());
//! ```

pub mod config;
pub mod db;
pub mod guard;
pub mod handlers;
pub mod params;
pub mod policy;
pub mod server;
pub mod types;

// Re-export main server type
pub use server::PostgresMcpServer;

// Re-export policy types for direct API usage
pub use guard::SqlGuard;
pub use types::{AccessMode, OperationCategory, PolicyDecision, PolicyViolation};
