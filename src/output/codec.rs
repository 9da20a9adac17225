//! Value Codec — typed scalar → canonical wire bytes.
//!
//! The single place that knows how each value type looks on the wire. Output
//! bytes are complete JSON fragments: quoted/escaped where JSON requires it,
//! bare for numbers and booleans.

use chrono::SecondsFormat;

use crate::model::TypedValue;
use crate::{Error, Result};

/// Encode one typed value as wire bytes.
///
/// Fallible by contract: a value type with no wire mapping reports
/// [`Error::UnsupportedValue`], and the caller decides whether that drops a
/// single leaf or aborts (tree building drops the leaf).
pub fn val_to_bytes(v: &TypedValue) -> Result<Vec<u8>> {
    match v {
        TypedValue::Str(s) | TypedValue::Default(s) | TypedValue::Password(s) => {
            Ok(serde_json::to_vec(s)?)
        }
        TypedValue::Binary(b) => Ok(serde_json::to_vec(&String::from_utf8_lossy(b))?),
        TypedValue::Int(i) => Ok(i.to_string().into_bytes()),
        TypedValue::Float(f) => Ok(format!("{f:.6}").into_bytes()),
        TypedValue::Bool(true) => Ok(b"true".to_vec()),
        TypedValue::Bool(false) => Ok(b"false".to_vec()),
        TypedValue::DateTime(t) => {
            // The zero timestamp renders as an empty string, not a zero-date
            // literal.
            if t.timestamp() == 0 && t.timestamp_subsec_nanos() == 0 {
                return Ok(b"\"\"".to_vec());
            }
            Ok(serde_json::to_vec(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))?)
        }
        TypedValue::Geo(g) => Ok(serde_json::to_vec(g)?),
        TypedValue::Uid(u) => Ok(format!("\"{u:#x}\"").into_bytes()),
        TypedValue::Vector(_) => Err(Error::UnsupportedValue(v.type_name())),
    }
}
