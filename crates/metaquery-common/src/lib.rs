//! Common utilities for metaquery
//!
//! This crate provides the error type shared by the query compiler, the
//! execution adapter and the command-line tool.

pub mod error;

pub use error::{MetaQueryError, Result};
