//! SQLite `CREATE TABLE` DDL rewriting.
//!
//! SQLite (in the supported version range) has no `ALTER TABLE ... DROP
//! COLUMN`, so dropping columns means rewriting the table's literal DDL from
//! `sqlite_master`, creating a replacement table from the rewritten text and
//! copying the surviving columns across.
//!
//! The column block is tokenized rather than regex-spliced: the scanner
//! tracks quote state (all four SQLite quoting styles) and parenthesis
//! depth, so column names that are substrings of each other, defaults
//! containing commas or parens, and inline `CHECK (...)` expressions are all
//! handled exactly.

use crate::error::{MigrateError, Result};

/// Result of removing columns from a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenCreateTable {
    /// The rewritten column block, starting at `(` and including any
    /// trailing table options (`WITHOUT ROWID`, `STRICT`).
    pub body: String,

    /// Surviving column names, unquoted, in declaration order.
    pub columns: Vec<String>,
}

/// Table-level constraint keywords: a definition starting with one of these
/// is not a column definition.
const CONSTRAINT_KEYWORDS: &[&str] = &["PRIMARY", "UNIQUE", "CHECK", "CONSTRAINT", "FOREIGN"];

/// Remove `drop` columns from the literal `CREATE TABLE` statement
/// `create_sql`, returning the rewritten column block and the surviving
/// column list.
///
/// Table-level constraints are preserved untouched. Column name comparison
/// is case-insensitive, matching SQLite identifier semantics.
///
/// # Errors
///
/// - No column block in the statement (`couldn't find column definitions`).
/// - Every column was dropped, leaving nothing to copy.
pub fn strip_columns(create_sql: &str, drop: &[&str]) -> Result<RewrittenCreateTable> {
    let open = find_top_level_open_paren(create_sql)
        .ok_or_else(|| MigrateError::schema("couldn't find column definitions"))?;

    let (segments, suffix) = scan_segments(&create_sql[open + 1..])?;

    let mut kept = Vec::with_capacity(segments.len());
    let mut columns = Vec::new();
    for segment in &segments {
        match parse_definition(segment) {
            Definition::Column(name) => {
                if drop.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
                    continue;
                }
                columns.push(name);
                kept.push(segment.trim().to_string());
            }
            Definition::Constraint => kept.push(segment.trim().to_string()),
        }
    }

    if columns.is_empty() {
        return Err(MigrateError::schema(
            "dropping these columns would leave no columns in the table",
        ));
    }

    let mut body = format!("({})", kept.join(", "));
    if !suffix.trim().is_empty() {
        body.push(' ');
        body.push_str(suffix.trim());
    }

    Ok(RewrittenCreateTable { body, columns })
}

enum Definition {
    Column(String),
    Constraint,
}

/// Find the first `(` outside of any quoted identifier (a quoted table name
/// may itself contain parens).
fn find_top_level_open_paren(sql: &str) -> Option<usize> {
    let mut chars = sql.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' => return Some(i),
            '"' | '`' | '\'' | '[' => {
                let close = closing_quote(c);
                skip_quoted(&mut chars, close);
            }
            _ => {}
        }
    }
    None
}

fn closing_quote(open: char) -> char {
    if open == '[' {
        ']'
    } else {
        open
    }
}

/// Consume a quoted region, honoring doubled-close-character escapes.
fn skip_quoted(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>, close: char) {
    while let Some((_, c)) = chars.next() {
        if c == close {
            // Doubled close char is an escape, not the end.
            if chars.peek().map(|&(_, n)| n) == Some(close) {
                chars.next();
            } else {
                return;
            }
        }
    }
}

/// Split the text after the opening paren into top-level comma-separated
/// definitions, returning them plus whatever follows the closing paren.
fn scan_segments(body: &str) -> Result<(Vec<String>, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 1u32;
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if !current.trim().is_empty() {
                        segments.push(current);
                    }
                    let suffix = body[i + c.len_utf8()..].to_string();
                    return Ok((segments, suffix));
                }
                current.push(c);
            }
            ',' if depth == 1 => {
                if !current.trim().is_empty() {
                    segments.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            '"' | '`' | '\'' | '[' => {
                current.push(c);
                let close = closing_quote(c);
                while let Some((_, q)) = chars.next() {
                    current.push(q);
                    if q == close {
                        if chars.peek().map(|&(_, n)| n) == Some(close) {
                            let (_, n) = chars.next().unwrap();
                            current.push(n);
                        } else {
                            break;
                        }
                    }
                }
            }
            _ => current.push(c),
        }
    }

    Err(MigrateError::schema(
        "unbalanced parentheses in column definitions",
    ))
}

/// Classify one definition and extract its leading identifier.
fn parse_definition(segment: &str) -> Definition {
    let trimmed = segment.trim_start();
    let mut chars = trimmed.chars().peekable();

    match chars.peek().copied() {
        Some(open) if matches!(open, '"' | '`' | '\'' | '[') => {
            chars.next();
            let close = closing_quote(open);
            let mut name = String::new();
            while let Some(c) = chars.next() {
                if c == close {
                    if chars.peek() == Some(&close) {
                        chars.next();
                        name.push(close);
                    } else {
                        break;
                    }
                } else {
                    name.push(c);
                }
            }
            Definition::Column(name)
        }
        Some(_) => {
            let word: String = trimmed
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if CONSTRAINT_KEYWORDS
                .iter()
                .any(|k| word.eq_ignore_ascii_case(k))
            {
                Definition::Constraint
            } else {
                Definition::Column(word)
            }
        }
        None => Definition::Constraint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "CREATE TABLE `drop_test` (\
        `id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
        `first` TEXT NULL, \
        `first_two` TEXT NULL, \
        `created_unix` INTEGER NULL)";

    #[test]
    fn test_strip_single_column() {
        let result = strip_columns(BASIC, &["first_two"]).unwrap();
        assert_eq!(result.columns, vec!["id", "first", "created_unix"]);
        assert!(!result.body.contains("first_two"));
        assert!(result.body.starts_with('('));
        assert!(result.body.ends_with(')'));
    }

    #[test]
    fn test_substring_column_names_do_not_collide() {
        // Dropping `first` must leave `first_two` intact.
        let result = strip_columns(BASIC, &["first"]).unwrap();
        assert_eq!(result.columns, vec!["id", "first_two", "created_unix"]);
        assert!(result.body.contains("`first_two` TEXT"));
    }

    #[test]
    fn test_strip_last_column_leaves_no_dangling_comma() {
        let result = strip_columns(BASIC, &["created_unix"]).unwrap();
        assert_eq!(result.columns, vec!["id", "first", "first_two"]);
        assert!(result.body.ends_with("`first_two` TEXT NULL)"));
    }

    #[test]
    fn test_default_containing_comma_and_paren() {
        let sql = "CREATE TABLE `t` (`a` TEXT DEFAULT 'x,(y', `b` INTEGER DEFAULT (1+2), `c` TEXT)";
        let result = strip_columns(sql, &["b"]).unwrap();
        assert_eq!(result.columns, vec!["a", "c"]);
        assert!(result.body.contains("'x,(y'"));
    }

    #[test]
    fn test_table_level_constraints_preserved() {
        let sql = "CREATE TABLE `t` (`a` INTEGER, `b` INTEGER, `c` TEXT, \
                   PRIMARY KEY (`a`,`b`), CHECK (`a` > 0))";
        let result = strip_columns(sql, &["c"]).unwrap();
        assert_eq!(result.columns, vec!["a", "b"]);
        assert!(result.body.contains("PRIMARY KEY (`a`,`b`)"));
        assert!(result.body.contains("CHECK (`a` > 0)"));
    }

    #[test]
    fn test_mixed_quoting_styles() {
        let sql = r#"CREATE TABLE "t" ("a" INTEGER, [b] TEXT, `c` BLOB, d REAL)"#;
        let result = strip_columns(sql, &["b", "d"]).unwrap();
        assert_eq!(result.columns, vec!["a", "c"]);
    }

    #[test]
    fn test_case_insensitive_match() {
        let result = strip_columns(BASIC, &["FIRST"]).unwrap();
        assert_eq!(result.columns, vec!["id", "first_two", "created_unix"]);
    }

    #[test]
    fn test_without_rowid_suffix_preserved() {
        let sql = "CREATE TABLE `t` (`a` TEXT PRIMARY KEY, `b` INTEGER) WITHOUT ROWID";
        let result = strip_columns(sql, &["b"]).unwrap();
        assert!(result.body.ends_with(") WITHOUT ROWID"));
    }

    #[test]
    fn test_missing_paren_is_error() {
        let err = strip_columns("CREATE TABLE `t`", &["a"]).unwrap_err();
        assert!(err.to_string().contains("couldn't find column definitions"));
    }

    #[test]
    fn test_dropping_everything_is_error() {
        let sql = "CREATE TABLE `t` (`a` TEXT, `b` INTEGER)";
        assert!(strip_columns(sql, &["a", "b"]).is_err());
    }

    #[test]
    fn test_escaped_quote_in_identifier() {
        let sql = "CREATE TABLE `t` (`we``ird` TEXT, `plain` INTEGER)";
        let result = strip_columns(sql, &["we`ird"]).unwrap();
        assert_eq!(result.columns, vec!["plain"]);
    }
}
