//! UPDATE, DELETE and INSERT query shapes.

use tracing::instrument;

use crate::executor::StatementExecutor;
use crate::table::Table;
use crate::{MetaValue, Result};
use super::compiler::{compile_delete, compile_insert, compile_update, CompiledQuery};
use super::predicate::{check_value, impl_filter_methods, FilterChain};
use super::types::{Column, MatchKind};

/// `column = value` assignment of an UPDATE or INSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDirective {
    column: Column,
    value: MetaValue,
}

impl SetDirective {
    /// Creates a directive, applying the same value rule as predicates.
    pub fn new(column: Column, value: impl Into<MetaValue>) -> Result<Self> {
        let value = value.into();
        check_value(column, &value)?;
        Ok(Self { column, value })
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn value(&self) -> &MetaValue {
        &self.value
    }
}

/// Starts an UPDATE setting `column` to `value`.
pub fn update(column: Column, value: impl Into<MetaValue>) -> Result<UpdateRoot> {
    UpdateRoot::new().set(column, value)
}

/// UPDATE without filter predicates yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRoot {
    directives: Vec<SetDirective>,
}

impl UpdateRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a set-directive; directives render in call order.
    pub fn set(mut self, column: Column, value: impl Into<MetaValue>) -> Result<Self> {
        self.directives.push(SetDirective::new(column, value)?);
        Ok(self)
    }

    pub fn where_clause(self, column: Column, value: impl Into<MetaValue>) -> Result<Update> {
        Ok(Update {
            directives: self.directives,
            filter: FilterChain::start(column, value)?,
        })
    }

    pub fn where_exact(self, column: Column, value: &str) -> Result<Update> {
        self.where_match(column, value, MatchKind::Exact)
    }

    pub fn where_match(self, column: Column, pattern: &str, kind: MatchKind) -> Result<Update> {
        Ok(Update {
            directives: self.directives,
            filter: FilterChain::start_match(column, pattern, kind)?,
        })
    }

    pub fn directives(&self) -> &[SetDirective] {
        &self.directives
    }

    /// Compiles an UPDATE touching every row.
    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_update(&self.directives, &[], table)
    }

    /// Compiles and runs the UPDATE, returning the affected-row count.
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<u64>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.execute(&compiled).await
    }
}

/// Filtered UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    directives: Vec<SetDirective>,
    filter: FilterChain,
}

impl_filter_methods!(Update);

impl Update {
    pub fn directives(&self) -> &[SetDirective] {
        &self.directives
    }

    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_update(&self.directives, self.filter.predicates(), table)
    }

    /// Compiles and runs the UPDATE, returning the affected-row count.
    #[instrument(skip_all, fields(table = %table.table_name(), directives = self.directives.len()))]
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<u64>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.execute(&compiled).await
    }
}

/// Starts a DELETE.
pub fn delete() -> DeleteRoot {
    DeleteRoot
}

/// DELETE without filter predicates; compiles to a statement clearing the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteRoot;

impl DeleteRoot {
    pub fn where_clause(self, column: Column, value: impl Into<MetaValue>) -> Result<Delete> {
        Ok(Delete {
            filter: FilterChain::start(column, value)?,
        })
    }

    pub fn where_exact(self, column: Column, value: &str) -> Result<Delete> {
        self.where_match(column, value, MatchKind::Exact)
    }

    pub fn where_match(self, column: Column, pattern: &str, kind: MatchKind) -> Result<Delete> {
        Ok(Delete {
            filter: FilterChain::start_match(column, pattern, kind)?,
        })
    }

    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_delete(&[], table)
    }

    /// Compiles and runs the unfiltered DELETE, returning the number of rows
    /// removed (every row of the table).
    #[instrument(skip_all, fields(table = %table.table_name()))]
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<u64>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.execute(&compiled).await
    }
}

/// Filtered DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    filter: FilterChain,
}

impl_filter_methods!(Delete);

impl Delete {
    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_delete(self.filter.predicates(), table)
    }

    /// Compiles and runs the DELETE, returning the affected-row count.
    #[instrument(skip_all, fields(table = %table.table_name(), predicates = self.filter.len()))]
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<u64>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.execute(&compiled).await
    }
}

/// Starts an INSERT assigning `value` to `column`.
pub fn insert(column: Column, value: impl Into<MetaValue>) -> Result<Insert> {
    Insert::new().value(column, value)
}

/// Single-row INSERT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    assignments: Vec<SetDirective>,
}

impl Insert {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column assignment.
    pub fn value(mut self, column: Column, value: impl Into<MetaValue>) -> Result<Self> {
        self.assignments.push(SetDirective::new(column, value)?);
        Ok(self)
    }

    pub fn assignments(&self) -> &[SetDirective] {
        &self.assignments
    }

    pub fn compile<T: Table + ?Sized>(&self, table: &T) -> Result<CompiledQuery> {
        compile_insert(&self.assignments, table)
    }

    /// Compiles and runs the INSERT, returning the affected-row count.
    pub async fn execute<T, E>(&self, table: &T, executor: &E) -> Result<u64>
    where
        T: Table + ?Sized,
        E: StatementExecutor + ?Sized,
    {
        let compiled = self.compile(table)?;
        executor.execute(&compiled).await
    }
}
