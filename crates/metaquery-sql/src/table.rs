//! Logical-to-physical table mapping.
//!
//! A [`Table`] tells the compiler which physical table a query targets and
//! which physical column(s) each logical [`Column`] expands to. A logical
//! column may expand to several physical columns; in a projection all of them
//! are emitted, in declaration order. Predicates and set-directives address
//! the first (primary) physical column only.

use std::collections::BTreeMap;

use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use crate::query::{validate_identifier, Column};
use crate::{MetaQueryError, Result};

/// Resolves logical columns to physical names.
pub trait Table: Send + Sync {
    /// Physical table name.
    fn table_name(&self) -> &str;

    /// Physical columns for `column`, in declaration order.
    ///
    /// Returns `None` when the column is not mapped. A returned slice is
    /// never empty.
    fn physical_columns(&self, column: Column) -> Option<&[String]>;

    /// Resolves `column`, failing with [`MetaQueryError::UnmappedColumn`].
    fn resolve(&self, column: Column) -> Result<&[String]> {
        match self.physical_columns(column) {
            Some(names) if !names.is_empty() => Ok(names),
            _ => Err(MetaQueryError::UnmappedColumn {
                column: column.name().to_string(),
                table: self.table_name().to_string(),
            }),
        }
    }

    /// First physical column of `column`.
    fn primary_column(&self, column: Column) -> Result<&str> {
        Ok(self.resolve(column)?[0].as_str())
    }
}

/// Validated, owned table mapping.
///
/// Deserializes from JSON of the form
/// `{"table": "meta", "columns": {"total_id": ["uuid"], "value": ["value", "type"]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTableMapping")]
pub struct TableMapping {
    table: String,
    columns: BTreeMap<Column, Vec<String>>,
}

#[derive(Deserialize)]
struct RawTableMapping {
    table: String,
    columns: BTreeMap<Column, Vec<String>>,
}

impl TryFrom<RawTableMapping> for TableMapping {
    type Error = MetaQueryError;

    fn try_from(raw: RawTableMapping) -> Result<Self> {
        raw.columns
            .into_iter()
            .fold(TableMapping::builder(&raw.table), |builder, (column, names)| {
                builder.map(column, names)
            })
            .build()
    }
}

impl TableMapping {
    /// Starts a mapping for the physical table `table`.
    pub fn builder(table: &str) -> TableMappingBuilder {
        TableMappingBuilder {
            table: table.to_string(),
            columns: BTreeMap::new(),
        }
    }

    /// Default single-column layout used by the meta store.
    pub fn default_meta(table: &str) -> Result<Self> {
        Self::builder(table)
            .map(Column::TotalId, ["total_id"])
            .map(Column::Key, ["meta_key"])
            .map(Column::Value, ["meta_value"])
            .build()
    }

    /// Loads a mapping from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Logical columns with a mapping.
    pub fn mapped_columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.keys().copied()
    }
}

impl Table for TableMapping {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn physical_columns(&self, column: Column) -> Option<&[String]> {
        self.columns.get(&column).map(Vec::as_slice)
    }
}

/// Builder for [`TableMapping`].
#[derive(Debug, Clone)]
pub struct TableMappingBuilder {
    table: String,
    columns: BTreeMap<Column, Vec<String>>,
}

impl TableMappingBuilder {
    /// Maps `column` to `physical` names, replacing any earlier mapping.
    pub fn map<I, S>(mut self, column: Column, physical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .insert(column, physical.into_iter().map(Into::into).collect());
        self
    }

    /// Validates every identifier and produces the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`MetaQueryError::Validation`] for an invalid identifier or a
    /// column mapped to an empty list.
    pub fn build(self) -> Result<TableMapping> {
        let table = normalize(&self.table)?;
        let mut columns = BTreeMap::new();
        for (column, names) in self.columns {
            if names.is_empty() {
                return Err(MetaQueryError::Validation(format!(
                    "Column {} of table {} maps to no physical column",
                    column, table
                )));
            }
            let names = names
                .iter()
                .map(|name| normalize(name))
                .collect::<Result<Vec<_>>>()?;
            columns.insert(column, names);
        }
        Ok(TableMapping { table, columns })
    }
}

fn normalize(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(name.nfkc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_order() {
        let table = TableMapping::builder("test")
            .map(Column::Value, ["value", "type"])
            .build()
            .unwrap();
        assert_eq!(table.table_name(), "test");
        assert_eq!(table.resolve(Column::Value).unwrap(), ["value", "type"]);
        assert_eq!(table.primary_column(Column::Value).unwrap(), "value");
    }

    #[test]
    fn test_unmapped_column() {
        let table = TableMapping::builder("test")
            .map(Column::Key, ["identifier"])
            .build()
            .unwrap();
        let err = table.resolve(Column::TotalId).unwrap_err();
        assert_eq!(
            err,
            MetaQueryError::UnmappedColumn {
                column: "total_id".to_string(),
                table: "test".to_string(),
            }
        );
        assert!(err.is_configuration_defect());
    }

    #[test]
    fn test_empty_physical_list_rejected() {
        let result = TableMapping::builder("test")
            .map(Column::Key, Vec::<String>::new())
            .build();
        assert!(matches!(result, Err(MetaQueryError::Validation(_))));
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        assert!(TableMapping::builder("bad name").build().is_err());
        assert!(TableMapping::builder("test")
            .map(Column::Key, ["key; --"])
            .build()
            .is_err());
    }

    #[test]
    fn test_identifiers_are_normalized() {
        let table = TableMapping::builder("ｍｅｔａ").build().unwrap();
        assert_eq!(table.table_name(), "meta");
    }

    #[test]
    fn test_default_meta_layout() {
        let table = TableMapping::default_meta("meta").unwrap();
        let mapped: Vec<Column> = table.mapped_columns().collect();
        assert_eq!(mapped, Column::ALL.to_vec());
        assert_eq!(table.primary_column(Column::Key).unwrap(), "meta_key");
    }

    #[test]
    fn test_from_json() {
        let table = TableMapping::from_json(
            r#"{"table": "test", "columns": {"total_id": ["uuid"], "value": ["value", "type"]}}"#,
        )
        .unwrap();
        assert_eq!(table.resolve(Column::TotalId).unwrap(), ["uuid"]);
        assert_eq!(table.resolve(Column::Value).unwrap(), ["value", "type"]);
        assert!(table.physical_columns(Column::Key).is_none());
    }

    #[test]
    fn test_from_json_validates() {
        let result = TableMapping::from_json(r#"{"table": "test", "columns": {"key": []}}"#);
        assert!(result.is_err());
    }
}
