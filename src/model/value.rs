//! Typed scalar values crossing the evaluation → output boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed scalar produced by the evaluation engine.
///
/// These are the wire-relevant types: the output side only needs to render
/// them, never to convert or compare them. `Geo` carries a ready GeoJSON
/// object; `Vector` exists in the value system but has no JSON rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedValue {
    Str(String),
    /// Untyped predicate value — rendered exactly like `Str`.
    Default(String),
    Binary(Vec<u8>),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    /// GeoJSON geometry object.
    Geo(serde_json::Value),
    /// Internal node identifier, rendered as a quoted hex literal.
    Uid(u64),
    Password(String),
    /// Embedding vector — present in the value system, not renderable here.
    Vector(Vec<f32>),
}

impl TypedValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            TypedValue::Str(_) => "string",
            TypedValue::Default(_) => "default",
            TypedValue::Binary(_) => "binary",
            TypedValue::Int(_) => "int",
            TypedValue::Float(_) => "float",
            TypedValue::Bool(_) => "bool",
            TypedValue::DateTime(_) => "datetime",
            TypedValue::Geo(_) => "geo",
            TypedValue::Uid(_) => "uid",
            TypedValue::Password(_) => "password",
            TypedValue::Vector(_) => "vector",
        }
    }

    /// Lenient boolean reading, used by `checkpwd` rendering.
    pub fn as_bool_lenient(&self) -> bool {
        match self {
            TypedValue::Bool(b) => *b,
            TypedValue::Int(i) => *i != 0,
            TypedValue::Str(s) | TypedValue::Default(s) => s == "true",
            _ => false,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for TypedValue { fn from(v: bool) -> Self { TypedValue::Bool(v) } }
impl From<i32> for TypedValue { fn from(v: i32) -> Self { TypedValue::Int(v as i64) } }
impl From<i64> for TypedValue { fn from(v: i64) -> Self { TypedValue::Int(v) } }
impl From<f64> for TypedValue { fn from(v: f64) -> Self { TypedValue::Float(v) } }
impl From<String> for TypedValue { fn from(v: String) -> Self { TypedValue::Str(v) } }
impl From<&str> for TypedValue { fn from(v: &str) -> Self { TypedValue::Str(v.to_owned()) } }
impl From<DateTime<Utc>> for TypedValue {
    fn from(v: DateTime<Utc>) -> Self { TypedValue::DateTime(v) }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Str(s) | TypedValue::Default(s) => write!(f, "{s}"),
            TypedValue::Binary(b) => write!(f, "<binary[{}]>", b.len()),
            TypedValue::Int(i) => write!(f, "{i}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Bool(b) => write!(f, "{b}"),
            TypedValue::DateTime(t) => write!(f, "{t}"),
            TypedValue::Geo(g) => write!(f, "{g}"),
            TypedValue::Uid(u) => write!(f, "{u:#x}"),
            TypedValue::Password(_) => write!(f, "<password>"),
            TypedValue::Vector(v) => write!(f, "<vector[{}]>", v.len()),
        }
    }
}
