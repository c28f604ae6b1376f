//! Query vocabulary: logical columns, boolean combinators and match kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical meta column, independent of the physical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    /// Identity of the record owning the entry
    TotalId,
    /// Entry key
    Key,
    /// Entry value (the opaque-value column)
    Value,
}

impl Column {
    /// All logical columns, in declaration order.
    pub const ALL: [Column; 3] = [Column::TotalId, Column::Key, Column::Value];

    /// Returns the logical name of the column.
    pub fn name(&self) -> &'static str {
        match self {
            Column::TotalId => "total_id",
            Column::Key => "key",
            Column::Value => "value",
        }
    }

    /// Whether the column accepts values other than text.
    pub fn is_opaque(&self) -> bool {
        matches!(self, Column::Value)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a predicate joins the chain accumulated before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// First predicate of a chain (no keyword)
    Init,
    /// AND
    And,
    /// OR
    Or,
}

impl FilterOperator {
    /// Returns the separator emitted before a predicate with this operator.
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOperator::Init => "",
            FilterOperator::And => " AND ",
            FilterOperator::Or => " OR ",
        }
    }
}

/// Anchoring applied to a pattern before it is stored in a predicate.
///
/// Every kind compiles to the same `REGEXP` operator; only the stored
/// pattern changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Matches anywhere in the cell
    #[default]
    Contains,
    /// Matches a whole word (`\bv\b`)
    Exact,
    /// Matches at the start of the cell (`^v`)
    StartsWith,
    /// Matches at the end of the cell (`v$`)
    EndsWith,
    /// Matches the entire cell (`^v$`)
    Full,
}

impl MatchKind {
    /// Wraps `pattern` in the anchors of this kind.
    pub fn anchor(&self, pattern: &str) -> String {
        match self {
            MatchKind::Contains => pattern.to_string(),
            MatchKind::Exact => format!("\\b{}\\b", pattern),
            MatchKind::StartsWith => format!("^{}", pattern),
            MatchKind::EndsWith => format!("{}$", pattern),
            MatchKind::Full => format!("^{}$", pattern),
        }
    }
}
