//! Filter chain builder and SQL compiler.
//!
//! Queries are built from a shape (projection, set-directives, assignments)
//! and an ordered filter chain, then compiled against a [`Table`] mapping
//! into SQL text with `?` placeholders and the matching parameter list.
//!
//! # Examples
//!
//! ## SELECT Query
//!
//! ```ignore
//! use metaquery_sql::query::{select, Column};
//!
//! let compiled = select([Column::Value, Column::TotalId])
//!     .where_clause(Column::Key, "home")?
//!     .and_exact(Column::TotalId, "a1b2")?
//!     .compile(&table)?;
//! // Result: "SELECT value, type, uuid FROM test WHERE identifier REGEXP ? AND uuid REGEXP ?;"
//! // Params: ["home", "\\ba1b2\\b"]
//! ```
//!
//! ## UPDATE Query
//!
//! ```ignore
//! use metaquery_sql::query::{update, Column};
//!
//! let compiled = update(Column::Value, "spawn")?
//!     .where_clause(Column::TotalId, "a1b2")?
//!     .or(Column::Key, "home")?
//!     .compile(&table)?;
//! // Result: "UPDATE test SET value = ? WHERE uuid REGEXP ? OR identifier REGEXP ?;"
//! // Params: ["spawn", "a1b2", "home"]
//! ```
//!
//! The chain is emitted flat, in call order. No parentheses are added, so the
//! database applies its own AND-before-OR precedence to mixed chains.
//!
//! [`Table`]: crate::table::Table

mod types;
mod helpers;
mod predicate;
mod compiler;
mod select;
mod modify;


pub use types::{Column, FilterOperator, MatchKind};
pub use helpers::{escape_pattern, validate_identifier, validate_identifier_part};
pub use predicate::{FilterChain, Predicate};
pub use compiler::{CompiledQuery, MATCH_OPERATOR, PLACEHOLDER};
pub use select::{select, Select, SelectRoot};
pub use modify::{delete, insert, update, Delete, DeleteRoot, Insert, SetDirective, Update, UpdateRoot};
