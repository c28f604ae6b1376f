//! Compiles query shapes into parameterized SQL.
//!
//! Every function here is pure: it reads the shape and the table mapping and
//! returns a complete [`CompiledQuery`] or an error, never a partial one.
//! Parameters are collected in the same pass that writes the placeholders, so
//! the i-th `?` in the text always binds the i-th parameter.

use crate::table::Table;
use crate::Result;
use super::predicate::Predicate;
use super::types::Column;
use super::modify::SetDirective;

/// Placeholder bound positionally by the driver.
pub const PLACEHOLDER: &str = "?";

/// Match operator shared by every predicate.
pub const MATCH_OPERATOR: &str = "REGEXP";

/// SQL text plus the parameters for its placeholders, in textual order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Statement text, terminated by `;`
    pub sql: String,
    /// One raw value per `?`, left to right
    pub params: Vec<String>,
    /// Number of cells per result row (0 for statements without rows)
    pub result_width: usize,
}

impl CompiledQuery {
    /// Splits into the `(sql, params)` pair.
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.sql, self.params)
    }

    /// Number of `?` placeholders in the statement text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches(PLACEHOLDER).count()
    }

    /// Truncated statement text for log fields.
    pub fn preview(&self, max_chars: usize) -> String {
        self.sql.chars().take(max_chars).collect()
    }
}

/// `SELECT <cols> FROM <table>[ WHERE <clause>];`
pub(crate) fn compile_select<T: Table + ?Sized>(
    columns: &[Column],
    predicates: &[Predicate],
    table: &T,
) -> Result<CompiledQuery> {
    if columns.is_empty() {
        return Err(crate::MetaQueryError::Query(
            "Cannot select with no columns".to_string(),
        ));
    }

    let mut projection: Vec<&str> = Vec::new();
    for column in columns {
        projection.extend(table.resolve(*column)?.iter().map(String::as_str));
    }

    let mut sql = format!("SELECT {} FROM {}", projection.join(", "), table.table_name());
    let mut params = Vec::with_capacity(predicates.len());
    render_where(predicates, table, &mut sql, &mut params)?;
    sql.push(';');

    Ok(CompiledQuery {
        sql,
        params,
        result_width: projection.len(),
    })
}

/// `UPDATE <table> SET <col> = ?[, ...][ WHERE <clause>];`
///
/// Directive parameters come first, then predicate parameters.
pub(crate) fn compile_update<T: Table + ?Sized>(
    directives: &[SetDirective],
    predicates: &[Predicate],
    table: &T,
) -> Result<CompiledQuery> {
    if directives.is_empty() {
        return Err(crate::MetaQueryError::Query(
            "Cannot update with no values".to_string(),
        ));
    }

    let mut params = Vec::with_capacity(directives.len() + predicates.len());
    let mut set_parts = Vec::with_capacity(directives.len());
    for directive in directives {
        let column = table.primary_column(directive.column())?;
        set_parts.push(format!("{} = {}", column, PLACEHOLDER));
        params.push(directive.value().to_param()?);
    }

    let mut sql = format!("UPDATE {} SET {}", table.table_name(), set_parts.join(", "));
    render_where(predicates, table, &mut sql, &mut params)?;
    sql.push(';');

    Ok(CompiledQuery {
        sql,
        params,
        result_width: 0,
    })
}

/// `DELETE FROM <table>[ WHERE <clause>];`
pub(crate) fn compile_delete<T: Table + ?Sized>(
    predicates: &[Predicate],
    table: &T,
) -> Result<CompiledQuery> {
    let mut sql = format!("DELETE FROM {}", table.table_name());
    let mut params = Vec::with_capacity(predicates.len());
    render_where(predicates, table, &mut sql, &mut params)?;
    sql.push(';');

    Ok(CompiledQuery {
        sql,
        params,
        result_width: 0,
    })
}

/// `INSERT INTO <table> (<cols>) VALUES (?, ...);`
pub(crate) fn compile_insert<T: Table + ?Sized>(
    assignments: &[SetDirective],
    table: &T,
) -> Result<CompiledQuery> {
    if assignments.is_empty() {
        return Err(crate::MetaQueryError::Query(
            "Cannot insert with no values".to_string(),
        ));
    }

    let mut columns = Vec::with_capacity(assignments.len());
    let mut params = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        columns.push(table.primary_column(assignment.column())?);
        params.push(assignment.value().to_param()?);
    }

    let placeholders = vec![PLACEHOLDER; assignments.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table.table_name(),
        columns.join(", "),
        placeholders
    );

    Ok(CompiledQuery {
        sql,
        params,
        result_width: 0,
    })
}

/// Appends ` WHERE <clause>` for a non-empty chain.
///
/// The chain is flat: each predicate is prefixed by its own operator's
/// keyword and no parentheses are emitted.
fn render_where<T: Table + ?Sized>(
    predicates: &[Predicate],
    table: &T,
    sql: &mut String,
    params: &mut Vec<String>,
) -> Result<()> {
    if predicates.is_empty() {
        return Ok(());
    }

    let mut clause = String::new();
    for predicate in predicates {
        let column = table.primary_column(predicate.column())?;
        clause.push_str(predicate.operator().to_sql());
        clause.push_str(&format!("{} {} {}", column, MATCH_OPERATOR, PLACEHOLDER));
        params.push(predicate.value().to_param()?);
    }

    sql.push_str(" WHERE ");
    sql.push_str(&clause);
    Ok(())
}
