//! SQL guard - access-mode enforcement for tool calls
//!
//! Holds the access mode fixed at startup and runs every caller-supplied
//! statement through the policy gate before it can reach the database.

use crate::policy;
use crate::types::{AccessMode, OperationCategory, PolicyDecision, PolicyViolation};

/// Statement guard bound to one access mode for the life of the server
#[derive(Debug, Clone, Copy)]
pub struct SqlGuard {
    mode: AccessMode,
}

impl SqlGuard {
    pub fn new(mode: AccessMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Check a statement arriving through the `category` tool
    ///
    /// `Ok(())` means the original SQL may be executed unchanged. On `Err`
    /// nothing may be sent to the database.
    pub fn check_sql(&self, sql: &str, category: OperationCategory) -> Result<(), PolicyViolation> {
        let decision = policy::evaluate(sql, self.mode, category);

        match decision {
            PolicyDecision::Allow => {
                tracing::debug!(mode = %self.mode, %category, "statement allowed");
            }
            PolicyDecision::Deny(violation) => {
                tracing::warn!(
                    mode = %self.mode,
                    %category,
                    reason = ?violation,
                    "statement denied"
                );
            }
        }

        decision.into_result()
    }
}
