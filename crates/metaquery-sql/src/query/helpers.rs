//! Query builder helper functions.

use crate::{MetaQueryError, Result};
use unicode_normalization::UnicodeNormalization;

/// Validates a physical SQL identifier (table/column name).
///
/// Supports both simple identifiers and schema-qualified names (e.g., "main.meta").
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MetaQueryError::Validation("Identifier cannot be empty".to_string()));
    }

    if name.contains('.') {
        let parts: Vec<&str> = name.split('.').collect();

        if parts.len() != 2 {
            return Err(MetaQueryError::Validation(
                format!("Invalid schema-qualified identifier '{}': must be in format 'schema.table'", name)
            ));
        }

        for part in parts {
            validate_identifier_part(part)?;
        }

        return Ok(());
    }

    validate_identifier_part(name)
}

/// Validates a single part of an identifier (no dots allowed).
pub fn validate_identifier_part(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MetaQueryError::Validation("Identifier part cannot be empty".to_string()));
    }

    // Normalize to NFKC to prevent Unicode confusables
    let name = name.nfkc().collect::<String>();

    if name.len() > 63 {
        return Err(MetaQueryError::Validation(
            format!("Identifier '{}' exceeds maximum length of 63", name)
        ));
    }

    let first_char = name.chars().next()
        .ok_or_else(|| MetaQueryError::Validation(
            format!("Identifier '{}' is empty or invalid", name)
        ))?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(MetaQueryError::Validation(
            format!("Identifier '{}' must start with a letter or underscore", name)
        ));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(MetaQueryError::Validation(
                format!("Identifier '{}' contains invalid character '{}'", name, ch)
            ));
        }
    }

    // SQLite reserves the sqlite_ prefix for internal tables
    let name_lower = name.to_lowercase();
    if name_lower.starts_with("sqlite_") {
        return Err(MetaQueryError::Validation(
            format!("Identifier '{}' uses the reserved sqlite_ prefix", name)
        ));
    }

    const SQL_KEYWORDS: &[&str] = &[
        "select", "insert", "update", "delete", "drop", "create", "alter",
        "truncate", "grant", "revoke", "exec", "execute", "union", "declare",
        "table", "index", "view", "schema", "database", "user", "role",
        "from", "where", "join", "inner", "outer", "left", "right",
        "on", "using", "and", "or", "not", "in", "exists", "between",
        "like", "is", "null", "true", "false", "case", "when",
        "then", "else", "end", "as", "order", "by", "group", "having",
        "limit", "offset", "distinct", "all", "set", "values", "into",
        "regexp", "glob", "match",
    ];

    if SQL_KEYWORDS.contains(&name_lower.as_str()) {
        return Err(MetaQueryError::Validation(
            format!("Identifier '{}' is a reserved SQL keyword", name)
        ));
    }

    Ok(())
}

/// Escapes regex metacharacters so `literal` matches itself under `REGEXP`.
pub fn escape_pattern(literal: &str) -> String {
    regex::escape(literal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("meta").is_ok());
        assert!(validate_identifier("total_id").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("main.meta").is_ok());
        assert!(validate_identifier("identifier").is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1meta").is_err());
        assert!(validate_identifier("meta; DROP TABLE meta").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("sqlite_master").is_err());
        assert!(validate_identifier("select").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_fullwidth_letters_normalized() {
        // NFKC folds fullwidth forms to ASCII
        assert!(validate_identifier("ｍｅｔａ").is_ok());
        assert!(validate_identifier("ｓｅｌｅｃｔ").is_err());
    }

    #[test]
    fn test_escape_pattern() {
        assert_eq!(escape_pattern("a.b"), "a\\.b");
        assert_eq!(escape_pattern("plain"), "plain");
        assert_eq!(escape_pattern("(x)*"), "\\(x\\)\\*");
    }
}
