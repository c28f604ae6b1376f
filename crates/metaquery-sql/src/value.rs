//! Values carried by predicates and set-directives.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Result;

/// A value stored in, or compared against, a meta column.
///
/// Only [`MetaValue::Text`] is accepted on the text-only columns. The opaque
/// value column takes any variant and binds non-text variants as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Plain text
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Double-precision float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Arbitrary JSON document
    Json(JsonValue),
}

impl MetaValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MetaValue::Text(_) => "text",
            MetaValue::Integer(_) => "integer",
            MetaValue::Float(_) => "float",
            MetaValue::Bool(_) => "bool",
            MetaValue::Json(_) => "json",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, MetaValue::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the value as the raw text bound to a `?` placeholder.
    ///
    /// Text is bound verbatim; every other variant is bound as its JSON form.
    pub fn to_param(&self) -> Result<String> {
        match self {
            MetaValue::Text(s) => Ok(s.clone()),
            MetaValue::Integer(i) => Ok(i.to_string()),
            MetaValue::Float(f) => Ok(serde_json::to_string(f)?),
            MetaValue::Bool(b) => Ok(b.to_string()),
            MetaValue::Json(json) => Ok(serde_json::to_string(json)?),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Text(s) => write!(f, "{}", s),
            MetaValue::Integer(i) => write!(f, "{}", i),
            MetaValue::Float(x) => write!(f, "{}", x),
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Json(json) => write!(f, "{}", json),
        }
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<&String> for MetaValue {
    fn from(value: &String) -> Self {
        MetaValue::Text(value.clone())
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Integer(i64::from(value))
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<JsonValue> for MetaValue {
    fn from(value: JsonValue) -> Self {
        MetaValue::Json(value)
    }
}
