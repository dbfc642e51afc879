//! Policy gate - the single entry point checked before any SQL runs

use crate::policy::{classify::classify, lexer, normalize::normalize};
use crate::types::{AccessMode, OperationCategory, PolicyDecision};

/// Decide whether `raw_sql` may run under `mode` through the `category` tool.
///
/// `Unrestricted` returns `Allow` without looking at the text. Otherwise the
/// text is scrubbed, reduced to a single statement and classified. The
/// scrubbed copy never leaves this function; on `Allow` the caller runs the
/// original `raw_sql` with its original parameters.
pub fn evaluate(raw_sql: &str, mode: AccessMode, category: OperationCategory) -> PolicyDecision {
    if mode == AccessMode::Unrestricted {
        return PolicyDecision::Allow;
    }

    let scrubbed = lexer::strip(raw_sql);
    match normalize(&scrubbed) {
        Ok(statement) => classify(statement.lower(), mode, category),
        Err(violation) => PolicyDecision::Deny(violation),
    }
}
