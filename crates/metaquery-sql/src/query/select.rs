//! SELECT query shape.

use tracing::instrument;

use crate::executor::{Row, StatementExecutor};
use crate::table::Table;
use crate::{MetaValue, Result};
use super::compiler::{compile_select, CompiledQuery};
use super::predicate::{impl_filter_methods, FilterChain};
use super::types::{Column, MatchKind};

/// Starts a SELECT projecting `columns` in order (repeats allowed).
pub fn select(columns: impl IntoIterator<Item = Column>) -> SelectRoot {
    SelectRoot::new(columns)
}

/// SELECT without filter predicates yet.
///
/// Only this type exposes `where_*`, so a chain always starts with exactly
/// one `Init` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectRoot {
    columns: Vec<Column>,
}

impl SelectRoot {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
        }
    }

    /// Filters on `value` matching anywhere in `column`.
    pub fn where_clause(self, column: Column, value: impl Into<MetaValue>) -> Result<Select> {
        Ok(Select {
            columns: self.columns,
            filter: FilterChain::start(column, value)?,
        })
    }

    /// Filters on `value` matching a whole word of `column`.
    pub fn where_exact(self, column: Column, value: &str) -> Result<Select> {
        self.where_match(column, value, MatchKind::Exact)
    }

    pub fn where_match(self, column: Column, pattern: &str, kind: MatchKind) -> Result<Select> {
        Ok(Select {
            columns: self.columns,
            filter: FilterChain::start_match(column, pattern, kind)?,
        })
    }

    /// Projected logical columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Compiles an unfiltered SELECT.
    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_select(&self.columns, &[], table)
    }

    /// Compiles and runs the SELECT, returning every row of the table.
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<Vec<Row>>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.fetch_rows(&compiled).await
    }
}

/// Filtered SELECT.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    columns: Vec<Column>,
    filter: FilterChain,
}

impl_filter_methods!(Select);

impl Select {
    /// Projected logical columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_select(&self.columns, self.filter.predicates(), table)
    }

    /// Compiles and runs the SELECT.
    ///
    /// Each row holds one cell per physical column of the projection, so a
    /// logical column mapped to N physical columns yields N adjacent cells.
    #[instrument(skip_all, fields(table = %table.table_name(), predicates = self.filter.len()))]
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<Vec<Row>>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.fetch_rows(&compiled).await
    }
}
