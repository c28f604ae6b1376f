//! Predicates and the ordered filter chain shared by every query shape.

use crate::{MetaQueryError, MetaValue, Result};
use super::types::{Column, FilterOperator, MatchKind};

/// Rejects non-text values on text-only columns.
pub(crate) fn check_value(column: Column, value: &MetaValue) -> Result<()> {
    if column.is_opaque() || value.is_text() {
        return Ok(());
    }
    Err(MetaQueryError::ValueType {
        column: column.name().to_string(),
        found: format!("{} value {}", value.kind(), value),
    })
}

/// One filter unit: `column REGEXP value`, joined to the chain by `operator`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: Column,
    value: MetaValue,
    operator: FilterOperator,
}

impl Predicate {
    /// Creates a predicate.
    ///
    /// # Errors
    ///
    /// Returns [`MetaQueryError::ValueType`] if `value` is not text and
    /// `column` is not the opaque value column.
    pub fn new(column: Column, value: impl Into<MetaValue>, operator: FilterOperator) -> Result<Self> {
        let value = value.into();
        check_value(column, &value)?;
        Ok(Self { column, value, operator })
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn value(&self) -> &MetaValue {
        &self.value
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }
}

/// Append-only, ordered list of predicates.
///
/// The first predicate is always tagged [`FilterOperator::Init`] and no later
/// one is. Insertion order is both the clause order and the binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    predicates: Vec<Predicate>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a chain with its `Init` predicate.
    pub(crate) fn start(column: Column, value: impl Into<MetaValue>) -> Result<Self> {
        let first = Predicate::new(column, value, FilterOperator::Init)?;
        Ok(Self { predicates: vec![first] })
    }

    /// Starts a chain with an anchored text pattern.
    pub(crate) fn start_match(column: Column, pattern: &str, kind: MatchKind) -> Result<Self> {
        Self::start(column, kind.anchor(pattern))
    }

    /// Appends an `And`/`Or` predicate.
    pub(crate) fn push(
        &mut self,
        column: Column,
        value: impl Into<MetaValue>,
        operator: FilterOperator,
    ) -> Result<()> {
        if self.predicates.is_empty() || operator == FilterOperator::Init {
            return Err(MetaQueryError::Query(format!(
                "{:?} predicate on column {} cannot follow {} predicate(s)",
                operator,
                column,
                self.predicates.len()
            )));
        }
        self.predicates.push(Predicate::new(column, value, operator)?);
        Ok(())
    }

    /// Returns the accumulated predicates in insertion order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Generates the `and`/`or` family on a filtered query shape.
///
/// The shape must have a `filter: FilterChain` field.
macro_rules! impl_filter_methods {
    ($shape:ty) => {
        impl $shape {
            /// Appends an AND predicate matching `value` anywhere in the column.
            pub fn and(
                mut self,
                column: $crate::query::Column,
                value: impl Into<$crate::MetaValue>,
            ) -> $crate::Result<Self> {
                self.filter.push(column, value, $crate::query::FilterOperator::And)?;
                Ok(self)
            }

            /// Appends an OR predicate matching `value` anywhere in the column.
            pub fn or(
                mut self,
                column: $crate::query::Column,
                value: impl Into<$crate::MetaValue>,
            ) -> $crate::Result<Self> {
                self.filter.push(column, value, $crate::query::FilterOperator::Or)?;
                Ok(self)
            }

            /// Appends an AND predicate matching `value` as a whole word.
            pub fn and_exact(self, column: $crate::query::Column, value: &str) -> $crate::Result<Self> {
                self.and_match(column, value, $crate::query::MatchKind::Exact)
            }

            /// Appends an OR predicate matching `value` as a whole word.
            pub fn or_exact(self, column: $crate::query::Column, value: &str) -> $crate::Result<Self> {
                self.or_match(column, value, $crate::query::MatchKind::Exact)
            }

            pub fn and_match(
                self,
                column: $crate::query::Column,
                pattern: &str,
                kind: $crate::query::MatchKind,
            ) -> $crate::Result<Self> {
                self.and(column, kind.anchor(pattern))
            }

            pub fn or_match(
                self,
                column: $crate::query::Column,
                pattern: &str,
                kind: $crate::query::MatchKind,
            ) -> $crate::Result<Self> {
                self.or(column, kind.anchor(pattern))
            }

            /// Returns the filter predicates in insertion order.
            pub fn predicates(&self) -> &[$crate::query::Predicate] {
                self.filter.predicates()
            }
        }
    };
}

pub(crate) use impl_filter_methods;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_value_on_text_column() {
        let predicate = Predicate::new(Column::Key, "name", FilterOperator::Init).unwrap();
        assert_eq!(predicate.column(), Column::Key);
        assert_eq!(predicate.value(), &MetaValue::Text("name".to_string()));
        assert_eq!(predicate.operator(), FilterOperator::Init);
    }

    #[test]
    fn test_non_text_value_rejected_on_text_column() {
        let err = Predicate::new(Column::TotalId, 7, FilterOperator::Init).unwrap_err();
        assert!(matches!(err, MetaQueryError::ValueType { ref column, .. } if column == "total_id"));
        assert!(err.to_string().contains("integer value 7"));
    }

    #[test]
    fn test_non_text_value_accepted_on_value_column() {
        let predicate = Predicate::new(Column::Value, true, FilterOperator::Or).unwrap();
        assert_eq!(predicate.value(), &MetaValue::Bool(true));
    }

    #[test]
    fn test_chain_keeps_insertion_order() {
        let mut chain = FilterChain::start(Column::Key, "a").unwrap();
        chain.push(Column::TotalId, "b", FilterOperator::Or).unwrap();
        chain.push(Column::Value, "c", FilterOperator::And).unwrap();

        let ops: Vec<FilterOperator> = chain.predicates().iter().map(|p| p.operator()).collect();
        assert_eq!(ops, vec![FilterOperator::Init, FilterOperator::Or, FilterOperator::And]);
        let values: Vec<&str> = chain.predicates().iter().filter_map(|p| p.value().as_text()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_push_on_empty_chain_rejected() {
        let mut chain = FilterChain::new();
        assert!(chain.push(Column::Key, "a", FilterOperator::And).is_err());
        assert!(chain.is_empty());
    }

    #[test]
    fn test_second_init_rejected() {
        let mut chain = FilterChain::start(Column::Key, "a").unwrap();
        assert!(chain.push(Column::Key, "b", FilterOperator::Init).is_err());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_failed_push_leaves_chain_untouched() {
        let mut chain = FilterChain::start(Column::Key, "a").unwrap();
        assert!(chain.push(Column::Key, 3, FilterOperator::And).is_err());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_start_match_anchors_pattern() {
        let chain = FilterChain::start_match(Column::Key, "home", MatchKind::Exact).unwrap();
        assert_eq!(chain.predicates()[0].value(), &MetaValue::Text("\\bhome\\b".to_string()));
    }
}
