//! Statement normalizer
//!
//! Enforces the one-statement-per-call shape on scrubbed text.

use crate::types::PolicyViolation;

/// Terminator between SQL statements
const TERMINATOR: char = ';';

/// A single scrubbed statement, trimmed and without its trailing terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStatement {
    text: String,
    lower: String,
}

impl NormalizedStatement {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lowercased copy used for keyword matching
    pub fn lower(&self) -> &str {
        &self.lower
    }
}

/// Trim `scrubbed`, drop at most one trailing `;`, and reject anything that
/// still contains a terminator.
pub fn normalize(scrubbed: &str) -> Result<NormalizedStatement, PolicyViolation> {
    let mut text = scrubbed.trim();
    if let Some(rest) = text.strip_suffix(TERMINATOR) {
        text = rest.trim_end();
    }

    if text.contains(TERMINATOR) {
        return Err(PolicyViolation::MultipleStatementsForbidden);
    }

    Ok(NormalizedStatement {
        text: text.to_string(),
        lower: text.to_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_trailing_terminator_removed() {
        let stmt = normalize("  SELECT 1 ;  ").unwrap();
        assert_eq!(stmt.text(), "SELECT 1");
        assert_eq!(stmt.lower(), "select 1");
    }

    #[test]
    fn test_no_terminator() {
        assert_eq!(normalize("select 1").unwrap().text(), "select 1");
    }

    #[test]
    fn test_two_statements_rejected() {
        assert_eq!(
            normalize("SELECT 1; SELECT 2"),
            Err(PolicyViolation::MultipleStatementsForbidden)
        );
    }

    #[test]
    fn test_only_one_terminator_stripped() {
        assert_eq!(
            normalize("SELECT 1;;"),
            Err(PolicyViolation::MultipleStatementsForbidden)
        );
        assert_eq!(
            normalize("SELECT 1 ; ;"),
            Err(PolicyViolation::MultipleStatementsForbidden)
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize("   ").unwrap().text(), "");
        assert_eq!(normalize(";").unwrap().text(), "");
    }
}
