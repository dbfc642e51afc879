//! Policy classifier
//!
//! Applies the access-mode rules to a normalized, lowercased statement. This
//! is keyword scanning over text whose literals and comments are already
//! gone, not SQL parsing.

use crate::types::{AccessMode, OperationCategory, PolicyDecision, PolicyViolation};

/// Statements a readonly caller may start with
const READONLY_LEADING: &[&str] = &["select", "with", "explain"];

/// Keywords that make a statement non-readonly wherever they appear
const READONLY_FORBIDDEN: &[&str] = &[
    "insert", "update", "delete", "create", "alter", "drop", "truncate", "grant", "revoke",
    "call", "do",
];

const LIMITED_PRIVILEGE: &[&str] = &["grant", "revoke"];
const LIMITED_DESTRUCTIVE: &[&str] = &["drop", "truncate"];

/// Decide whether `lower` may run under `mode` through the `category` tool
pub fn classify(lower: &str, mode: AccessMode, category: OperationCategory) -> PolicyDecision {
    let verdict = match mode {
        AccessMode::ReadOnly => check_readonly(lower, category),
        AccessMode::Limited => check_limited(lower),
        // The gate never sends unrestricted statements here
        AccessMode::Unrestricted => Err(PolicyViolation::UnknownAccessMode),
    };

    match verdict {
        Ok(()) => PolicyDecision::Allow,
        Err(violation) => PolicyDecision::Deny(violation),
    }
}

fn check_readonly(lower: &str, category: OperationCategory) -> Result<(), PolicyViolation> {
    if category == OperationCategory::Execute {
        return Err(PolicyViolation::ToolForbidden);
    }

    let body = lower.trim_start();
    let Some(leading) = READONLY_LEADING
        .iter()
        .copied()
        .find(|kw| is_word_at(body, 0, kw))
    else {
        return Err(PolicyViolation::StatementTypeForbidden);
    };

    if contains_any_word(body, READONLY_FORBIDDEN) {
        return Err(PolicyViolation::StatementTypeForbidden);
    }

    if leading == "explain" {
        let explained = &body[leading.len()..];
        if !contains_any_word(explained, &["select", "with"]) {
            return Err(PolicyViolation::StatementTypeForbidden);
        }
    }

    Ok(())
}

fn check_limited(lower: &str) -> Result<(), PolicyViolation> {
    if contains_any_word(lower, LIMITED_PRIVILEGE) || contains_any_word(lower, LIMITED_DESTRUCTIVE)
    {
        return Err(PolicyViolation::StatementTypeForbidden);
    }

    if contains_alter_system(lower) {
        return Err(PolicyViolation::StatementTypeForbidden);
    }

    // Only the earliest UPDATE/DELETE is checked; later ones ride on its WHERE
    let first_write = [find_word(lower, "update"), find_word(lower, "delete")]
        .into_iter()
        .flatten()
        .min();

    if let Some(offset) = first_write {
        if !has_where_clause(&lower[offset..]) {
            return Err(PolicyViolation::MissingWhereClause);
        }
    }

    Ok(())
}

// ============================================================================
// Matching primitives
// ============================================================================

/// True when `word` occurs at byte offset `at` of `text` with no
/// alphanumeric character directly before or after it.
pub fn is_word_at(text: &str, at: usize, word: &str) -> bool {
    let end = at + word.len();
    if text.get(at..end) != Some(word) {
        return false;
    }

    let before = text[..at].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Byte offset of the first whole-word occurrence of `word`
pub fn find_word(text: &str, word: &str) -> Option<usize> {
    text.match_indices(word)
        .map(|(at, _)| at)
        .find(|&at| is_word_at(text, at, word))
}

fn contains_any_word(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| find_word(text, word).is_some())
}

/// `alter`, at least one whitespace character, then `system`, as whole words
fn contains_alter_system(text: &str) -> bool {
    text.match_indices("alter").any(|(at, kw)| {
        if !is_word_at(text, at, kw) {
            return false;
        }
        let rest = &text[at + kw.len()..];
        let gap = rest.len() - rest.trim_start().len();
        gap > 0 && is_word_at(rest, gap, "system")
    })
}

/// `" where "` somewhere after the write keyword, or `" where"` at the very
/// end. Plain spaces only: a newline or tab before `where` does not count.
fn has_where_clause(tail: &str) -> bool {
    tail.contains(" where ") || tail.ends_with(" where")
}

#[cfg(test)]
mod tests {
    use super::*;

    use AccessMode::*;
    use OperationCategory::*;

    fn deny(v: PolicyViolation) -> PolicyDecision {
        PolicyDecision::Deny(v)
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(find_word("select updated_at from t", "update"), None);
        assert_eq!(find_word("select * from airdrop", "drop"), None);
        assert_eq!(find_word("drop table t", "drop"), Some(0));
        assert_eq!(find_word("x.update(1)", "update"), Some(2));
        assert_eq!(find_word("updates update", "update"), Some(8));
    }

    #[test]
    fn test_readonly_allows_reads() {
        assert_eq!(classify("select 1", ReadOnly, Query), PolicyDecision::Allow);
        assert_eq!(
            classify("with x as (select 1) select * from x", ReadOnly, Query),
            PolicyDecision::Allow
        );
        assert_eq!(classify("explain select 1", ReadOnly, Query), PolicyDecision::Allow);
        assert_eq!(classify("  select(1)", ReadOnly, Query), PolicyDecision::Allow);
    }

    #[test]
    fn test_readonly_execute_tool_forbidden() {
        assert_eq!(
            classify("select 1", ReadOnly, Execute),
            deny(PolicyViolation::ToolForbidden)
        );
    }

    #[test]
    fn test_readonly_leading_keyword() {
        assert_eq!(
            classify("insert into t values (1)", ReadOnly, Query),
            deny(PolicyViolation::StatementTypeForbidden)
        );
        assert_eq!(
            classify("selection", ReadOnly, Query),
            deny(PolicyViolation::StatementTypeForbidden)
        );
        assert_eq!(
            classify("", ReadOnly, Query),
            deny(PolicyViolation::StatementTypeForbidden)
        );
    }

    #[test]
    fn test_readonly_forbidden_anywhere() {
        assert_eq!(
            classify(
                "with d as (delete from t returning *) select * from d",
                ReadOnly,
                Query
            ),
            deny(PolicyViolation::StatementTypeForbidden)
        );
        assert_eq!(
            classify("select do from t", ReadOnly, Query),
            deny(PolicyViolation::StatementTypeForbidden)
        );
    }

    #[test]
    fn test_readonly_explain_needs_select() {
        assert_eq!(
            classify("explain delete from t", ReadOnly, Query),
            deny(PolicyViolation::StatementTypeForbidden)
        );
        assert_eq!(
            classify("explain analyze", ReadOnly, Query),
            deny(PolicyViolation::StatementTypeForbidden)
        );
        assert_eq!(
            classify("explain (analyze, buffers) with a as (select 1) select * from a", ReadOnly, Query),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_limited_forbidden_keywords() {
        for sql in [
            "grant select on t to bob",
            "revoke all on t from bob",
            "drop table t",
            "truncate t",
            "alter system set work_mem = '1mb'",
            "alter   system reset all",
        ] {
            assert_eq!(
                classify(sql, Limited, Execute),
                deny(PolicyViolation::StatementTypeForbidden),
                "{sql}"
            );
        }
    }

    #[test]
    fn test_limited_allows_other_alter() {
        assert_eq!(
            classify("alter table t add column systemic int", Limited, Execute),
            PolicyDecision::Allow
        );
        assert_eq!(
            classify("insert into t values (1)", Limited, Query),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_limited_where_required() {
        assert_eq!(
            classify("update t set x=1", Limited, Execute),
            deny(PolicyViolation::MissingWhereClause)
        );
        assert_eq!(
            classify("delete from t", Limited, Execute),
            deny(PolicyViolation::MissingWhereClause)
        );
        assert_eq!(
            classify("update t set x=1 where id=1", Limited, Execute),
            PolicyDecision::Allow
        );
        assert_eq!(
            classify("delete from t\nwhere id = 1", Limited, Execute),
            deny(PolicyViolation::MissingWhereClause)
        );
        assert_eq!(
            classify("update t set x=1\twhere id=1", Limited, Execute),
            deny(PolicyViolation::MissingWhereClause)
        );
        assert_eq!(
            classify("delete from t\n where id = 1", Limited, Execute),
            PolicyDecision::Allow
        );
        assert_eq!(
            classify("delete from t where", Limited, Execute),
            PolicyDecision::Allow
        );
        assert_eq!(
            classify("delete from nowhere", Limited, Execute),
            deny(PolicyViolation::MissingWhereClause)
        );
    }

    #[test]
    fn test_limited_where_before_write_does_not_count() {
        assert_eq!(
            classify(
                "with x as (select * from a where b = 1) delete from t",
                Limited,
                Execute
            ),
            deny(PolicyViolation::MissingWhereClause)
        );
    }

    #[test]
    fn test_limited_only_first_write_checked() {
        assert_eq!(
            classify(
                "with u as (update a set x = 1 where id = 2 returning *) delete from b",
                Limited,
                Execute
            ),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_limited_updates_table_name() {
        assert_eq!(
            classify("select * from updates", Limited, Query),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_unrestricted_is_not_classified() {
        assert_eq!(
            classify("select 1", Unrestricted, Query),
            deny(PolicyViolation::UnknownAccessMode)
        );
    }

    #[test]
    fn test_deterministic() {
        let a = classify("update t set x = 1", Limited, Execute);
        let b = classify("update t set x = 1", Limited, Execute);
        assert_eq!(a, b);
    }
}
