//! Facets — key/value annotations on edges and scalar values.
//!
//! Facets arrive in their raw wire form and are decoded on demand while the
//! output tree is being built. A decoded facet renders as a sibling scalar
//! field named `<field>|<key>`, or as its alias when one was given.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TypedValue;
use crate::{Error, Result};

/// Separator between a field name and a facet key in the rendered output.
pub const FACET_DELIMITER: &str = "|";

/// Wire type tag of a raw facet value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacetValType {
    /// UTF-8 bytes.
    Str,
    /// 8-byte little-endian i64.
    Int,
    /// 8-byte little-endian f64 bits.
    Float,
    /// Single byte, 0 or 1.
    Bool,
    /// RFC 3339 UTF-8 bytes.
    DateTime,
}

/// A raw facet as attached by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub key: String,
    /// Empty when no alias was given in the query.
    pub alias: String,
    pub val_type: FacetValType,
    pub value: Vec<u8>,
}

/// The facets attached to one destination uid (or one scalar value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub facets: Vec<Facet>,
}

/// One row of the facets matrix: facets per destination uid, aligned with the
/// uid matrix row for the same source uid.
pub type FacetsList = Vec<Facets>;

impl Facet {
    pub fn new(key: impl Into<String>, val_type: FacetValType, value: Vec<u8>) -> Self {
        Facet { key: key.into(), alias: String::new(), val_type, value }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    // Convenience constructors for the common facet types.

    pub fn string(key: impl Into<String>, v: &str) -> Self {
        Facet::new(key, FacetValType::Str, v.as_bytes().to_vec())
    }

    pub fn int(key: impl Into<String>, v: i64) -> Self {
        Facet::new(key, FacetValType::Int, v.to_le_bytes().to_vec())
    }

    pub fn float(key: impl Into<String>, v: f64) -> Self {
        Facet::new(key, FacetValType::Float, v.to_le_bytes().to_vec())
    }

    pub fn boolean(key: impl Into<String>, v: bool) -> Self {
        Facet::new(key, FacetValType::Bool, vec![u8::from(v)])
    }

    pub fn datetime(key: impl Into<String>, v: DateTime<Utc>) -> Self {
        Facet::new(key, FacetValType::DateTime, v.to_rfc3339().into_bytes())
    }

    /// Decode the raw wire bytes into a typed value. Malformed bytes are a
    /// fatal structural error: the matrices were produced by the same engine
    /// that tagged them.
    pub fn decode(&self) -> Result<TypedValue> {
        match self.val_type {
            FacetValType::Str => {
                let s = std::str::from_utf8(&self.value).map_err(|e| self.bad(e))?;
                Ok(TypedValue::Str(s.to_owned()))
            }
            FacetValType::Int => {
                let raw = self.fixed_bytes::<8>()?;
                Ok(TypedValue::Int(i64::from_le_bytes(raw)))
            }
            FacetValType::Float => {
                let raw = self.fixed_bytes::<8>()?;
                Ok(TypedValue::Float(f64::from_le_bytes(raw)))
            }
            FacetValType::Bool => match self.value.as_slice() {
                [0] => Ok(TypedValue::Bool(false)),
                [1] => Ok(TypedValue::Bool(true)),
                _ => Err(self.bad("expected a single 0/1 byte")),
            },
            FacetValType::DateTime => {
                let s = std::str::from_utf8(&self.value).map_err(|e| self.bad(e))?;
                let t = DateTime::parse_from_rfc3339(s).map_err(|e| self.bad(e))?;
                Ok(TypedValue::DateTime(t.with_timezone(&Utc)))
            }
        }
    }

    fn fixed_bytes<const N: usize>(&self) -> Result<[u8; N]> {
        self.value
            .as_slice()
            .try_into()
            .map_err(|_| self.bad(format!("expected {N} bytes, got {}", self.value.len())))
    }

    fn bad(&self, reason: impl ToString) -> Error {
        Error::FacetDecode { key: self.key.clone(), reason: reason.to_string() }
    }
}

/// Rendered field name for a facet: alias wins, else `<field>|<key>`.
pub fn facet_name(field_name: &str, facet: &Facet) -> String {
    if !facet.alias.is_empty() {
        return facet.alias.clone();
    }
    format!("{field_name}{FACET_DELIMITER}{}", facet.key)
}
