//! Weakly-typed cell values and their coercion rules.

use std::fmt;

use serde::ser::{Serialize, Serializer};
use thiserror::Error;

/// One cell of a source row.
///
/// Readers produce the loosest faithful representation of each cell; typed
/// conversion then coerces cells into the target field types. Nested JSON
/// structures are carried as their raw JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Failure to interpret a cell as a requested target type.
///
/// Conversion treats this as advisory: the failure is logged and the field
/// keeps its zero value, the record is never dropped.
#[derive(Debug, Clone, Error)]
#[error("cannot interpret {value:?} as {wanted}")]
pub struct CoerceError {
    wanted: &'static str,
    value: String,
}

impl CoerceError {
    fn new(wanted: &'static str, value: impl Into<String>) -> Self {
        Self {
            wanted,
            value: value.into(),
        }
    }

    /// The cell parsed, but the parsed value does not fit the target type.
    pub(crate) fn out_of_range(wanted: &'static str, cell: &CellValue) -> Self {
        Self::new(wanted, cell.to_string())
    }
}

impl CellValue {
    /// True for `Null` and for empty strings.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Str(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Borrows the inner string, if this cell is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Str(text) => Some(text),
            _ => None,
        }
    }

    /// Integer coercion.
    ///
    /// Empty cells count as zero. Floats truncate toward zero. Strings are
    /// parsed as integers first, then as floats.
    pub fn coerce_i64(&self) -> Result<i64, CoerceError> {
        match self {
            CellValue::Null => Ok(0),
            CellValue::Bool(flag) => Ok(i64::from(*flag)),
            CellValue::Int(value) => Ok(*value),
            CellValue::Float(value) => Ok(*value as i64),
            CellValue::Str(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(0);
                }
                if let Ok(value) = text.parse::<i64>() {
                    return Ok(value);
                }
                text.parse::<f64>()
                    .map(|value| value as i64)
                    .map_err(|_| CoerceError::new("integer", text))
            }
        }
    }

    /// Float coercion. Empty cells count as zero.
    pub fn coerce_f64(&self) -> Result<f64, CoerceError> {
        match self {
            CellValue::Null => Ok(0.0),
            CellValue::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
            CellValue::Int(value) => Ok(*value as f64),
            CellValue::Float(value) => Ok(*value),
            CellValue::Str(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(0.0);
                }
                text.parse::<f64>()
                    .map_err(|_| CoerceError::new("float", text))
            }
        }
    }

    /// Boolean coercion.
    ///
    /// Accepts the usual truthy/falsy spellings case-insensitively
    /// (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`,
    /// `enabled`/`disabled`); any numeric cell is true when non-zero;
    /// empty cells are false.
    pub fn coerce_bool(&self) -> Result<bool, CoerceError> {
        match self {
            CellValue::Null => Ok(false),
            CellValue::Bool(flag) => Ok(*flag),
            CellValue::Int(value) => Ok(*value != 0),
            CellValue::Float(value) => Ok(*value != 0.0),
            CellValue::Str(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(false);
                }
                if let Some(flag) = parse_lenient_bool(text) {
                    return Ok(flag);
                }
                text.parse::<f64>()
                    .map(|value| value != 0.0)
                    .map_err(|_| CoerceError::new("boolean", text))
            }
        }
    }
}

/// Parses the lenient boolean spellings shared by typed conversion and the
/// key-value accessors. Returns `None` for anything outside the set.
pub(crate) fn parse_lenient_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// Renders the cell the way it would appear in its source file.
/// `Null` renders as the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(flag) => write!(f, "{flag}"),
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Str(text) => f.write_str(text),
        }
    }
}

/// Serializes as the natural JSON value, not as a tagged enum.
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(flag) => serializer.serialize_bool(*flag),
            CellValue::Int(value) => serializer.serialize_i64(*value),
            CellValue::Float(value) => serializer.serialize_f64(*value),
            CellValue::Str(text) => serializer.serialize_str(text),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Str(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Str(text)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(flag: bool) -> Self {
        CellValue::Bool(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_coerce_to_zero() {
        assert_eq!(CellValue::from("").coerce_i64().unwrap(), 0);
        assert_eq!(CellValue::from("   ").coerce_i64().unwrap(), 0);
        assert_eq!(CellValue::Null.coerce_i64().unwrap(), 0);
        assert_eq!(CellValue::from("").coerce_f64().unwrap(), 0.0);
        assert!(!CellValue::from("").coerce_bool().unwrap());
    }

    #[test]
    fn integer_coercion_truncates_floats() {
        assert_eq!(CellValue::from("3.9").coerce_i64().unwrap(), 3);
        assert_eq!(CellValue::from("-3.9").coerce_i64().unwrap(), -3);
        assert_eq!(CellValue::Float(7.5).coerce_i64().unwrap(), 7);
    }

    #[test]
    fn integer_coercion_rejects_garbage() {
        let err = CellValue::from("sword").coerce_i64().unwrap_err();
        assert!(err.to_string().contains("sword"));
    }

    #[test]
    fn boolean_spellings() {
        for truthy in ["true", "TRUE", "Yes", "on", "Enabled", "1"] {
            assert!(CellValue::from(truthy).coerce_bool().unwrap(), "{truthy}");
        }
        for falsy in ["false", "No", "OFF", "disabled", "0"] {
            assert!(!CellValue::from(falsy).coerce_bool().unwrap(), "{falsy}");
        }
        assert!(CellValue::from("2").coerce_bool().unwrap());
        assert!(CellValue::Int(-1).coerce_bool().unwrap());
        assert!(!CellValue::Int(0).coerce_bool().unwrap());
        assert!(CellValue::from("maybe").coerce_bool().is_err());
    }

    #[test]
    fn display_matches_source_form() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Int(42).to_string(), "42");
        assert_eq!(CellValue::Float(1.0).to_string(), "1");
        assert_eq!(CellValue::from("hi").to_string(), "hi");
    }

    #[test]
    fn serializes_as_plain_json() {
        let json = serde_json::to_string(&CellValue::Int(5)).unwrap();
        assert_eq!(json, "5");
        let json = serde_json::to_string(&CellValue::from("x")).unwrap();
        assert_eq!(json, "\"x\"");
        let json = serde_json::to_string(&CellValue::Null).unwrap();
        assert_eq!(json, "null");
    }
}
