//! Error types for metaquery

use thiserror::Error;

/// Result type alias for metaquery operations
pub type Result<T> = std::result::Result<T, MetaQueryError>;

/// Unified error type for all metaquery operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetaQueryError {
    /// A non-text value was supplied for a text-only column.
    #[error("Value type error: column {column} only accepts text values, got {found}")]
    ValueType { column: String, found: String },

    /// The table mapping has no physical column for a logical column.
    #[error("Unmapped column: {column} has no physical mapping in table {table}")]
    UnmappedColumn { column: String, table: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // Errors raised by the driver while a compiled statement runs

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl MetaQueryError {
    /// Returns true if the error was raised by the driver during execution
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            MetaQueryError::Backend(_)
                | MetaQueryError::Connection(_)
                | MetaQueryError::Timeout(_)
                | MetaQueryError::Deserialization(_)
        )
    }

    /// Returns true if the error points at a broken table mapping
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            MetaQueryError::UnmappedColumn { .. } | MetaQueryError::Validation(_)
        )
    }
}

impl From<serde_json::Error> for MetaQueryError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            MetaQueryError::Deserialization(err.to_string())
        } else {
            MetaQueryError::Serialization(err.to_string())
        }
    }
}

// SQLite driver error conversions (when sqlite-errors feature is enabled)
#[cfg(feature = "sqlite-errors")]
impl From<sqlx::Error> for MetaQueryError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error;
        match &err {
            Error::Configuration(_) => MetaQueryError::Connection(err.to_string()),
            Error::Database(db_err) => {
                // SQLite primary result codes, see https://www.sqlite.org/rescode.html
                if let Some(code) = db_err.code() {
                    let code_str: &str = &code;
                    match code_str {
                        // SQLITE_BUSY / SQLITE_LOCKED
                        "5" | "6" => return MetaQueryError::Timeout(err.to_string()),
                        // SQLITE_CANTOPEN
                        "14" => return MetaQueryError::Connection(err.to_string()),
                        _ => {}
                    }
                }
                MetaQueryError::Backend(err.to_string())
            }
            Error::Io(_) => MetaQueryError::Connection(err.to_string()),
            Error::Tls(_) => MetaQueryError::Connection(err.to_string()),
            Error::Protocol(_) => MetaQueryError::Connection(err.to_string()),
            Error::TypeNotFound { .. } => MetaQueryError::Deserialization(err.to_string()),
            Error::ColumnDecode { .. } => MetaQueryError::Deserialization(err.to_string()),
            Error::Decode(_) => MetaQueryError::Deserialization(err.to_string()),
            Error::PoolTimedOut => MetaQueryError::Timeout("Connection pool timed out".to_string()),
            Error::PoolClosed => MetaQueryError::Connection("Connection pool closed".to_string()),
            _ => MetaQueryError::Backend(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_value_type() {
        let err = MetaQueryError::ValueType {
            column: "key".to_string(),
            found: "integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Value type error: column key only accepts text values, got integer"
        );
    }

    #[test]
    fn test_error_display_unmapped_column() {
        let err = MetaQueryError::UnmappedColumn {
            column: "value".to_string(),
            table: "meta".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unmapped column: value has no physical mapping in table meta"
        );
    }

    #[test]
    fn test_error_display_backend() {
        let err = MetaQueryError::Backend("no such table: meta".to_string());
        assert_eq!(err.to_string(), "Backend error: no such table: meta");
    }

    #[test]
    fn test_error_display_query() {
        let err = MetaQueryError::Query("empty projection".to_string());
        assert_eq!(err.to_string(), "Query error: empty projection");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<Vec<String>>("invalid").unwrap_err();
        let err: MetaQueryError = json_err.into();
        assert!(matches!(err, MetaQueryError::Deserialization(_)));
    }

    #[test]
    fn test_is_backend() {
        assert!(MetaQueryError::Backend("test".to_string()).is_backend());
        assert!(MetaQueryError::Connection("test".to_string()).is_backend());
        assert!(MetaQueryError::Timeout("test".to_string()).is_backend());
        assert!(!MetaQueryError::Query("test".to_string()).is_backend());
        assert!(!MetaQueryError::Validation("test".to_string()).is_backend());
    }

    #[test]
    fn test_is_configuration_defect() {
        let unmapped = MetaQueryError::UnmappedColumn {
            column: "key".to_string(),
            table: "meta".to_string(),
        };
        assert!(unmapped.is_configuration_defect());
        assert!(MetaQueryError::Validation("test".to_string()).is_configuration_defect());
        assert!(!MetaQueryError::Backend("test".to_string()).is_configuration_defect());
    }
}
