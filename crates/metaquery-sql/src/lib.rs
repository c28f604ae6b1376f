//! Filter chain builder and parameterized SQL compiler for a key/value meta store.
//!
//! The crate turns an ordered boolean filter chain plus a logical-to-physical
//! column mapping into SQL text with `?` placeholders and an index-aligned
//! parameter list, then hands the pair to an execution adapter.
//!
//! # Architecture
//!
//! ```text
//!   Column / FilterOperator / MatchKind      (query::types)
//!           |
//!   Predicate + FilterChain                  (query::predicate)
//!           |
//!   Select / Update / Delete / Insert        (query::select, query::modify)
//!           |
//!   compiler + Table mapping                 (query::compiler, table)
//!           |
//!   StatementExecutor (sqlx SQLite)          (executor, connection)
//!           |
//!   MetaStore                                (meta)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use metaquery_sql::query::{select, Column};
//! use metaquery_sql::{Connection, PoolConfig, SqliteExecutor, TableMapping};
//!
//! # async fn example() -> metaquery_sql::Result<()> {
//! let conn = Connection::open("sqlite://meta.db", PoolConfig::default()).await?;
//! let executor = SqliteExecutor::new(&conn);
//! let table = TableMapping::default_meta("meta")?;
//!
//! let rows = select([Column::Key, Column::Value])
//!     .where_exact(Column::TotalId, "a1b2")?
//!     .or(Column::Key, "^home")?
//!     .execute(&table, &executor)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Query shapes are plain owned values built by one call chain and are not
//! meant to be shared. Compilation is synchronous and pure. The pool behind
//! [`SqliteExecutor`] is cheap to clone across tasks.

/// Query vocabulary, builders and the SQL compiler.
pub mod query;

/// Logical-to-physical table mapping.
pub mod table;

/// Values carried by predicates and directives.
pub mod value;

/// SQLite connection pooling with the `REGEXP` function registered.
pub mod connection;

/// Statement execution with slow statement logging.
pub mod executor;

/// Key/value meta store.
pub mod meta;

pub use connection::{Connection, PoolConfig};
pub use executor::{ExecutorConfig, Row, SqliteExecutor, StatementExecutor};
pub use meta::{find_query, MetaEntry, MetaStore};
pub use query::{
    Column, CompiledQuery, FilterChain, FilterOperator, MatchKind, Predicate, Select, SelectRoot,
    SetDirective, Update, UpdateRoot,
};
pub use table::{Table, TableMapping, TableMappingBuilder};
pub use value::MetaValue;

pub use metaquery_common::{MetaQueryError, Result};
