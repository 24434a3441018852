//! Declared value kinds for frame columns
//!
//! Frame cells are a closed set of variants, one per [`ValueKind`].
//! Conversions dispatch on the tag instead of inspecting values at runtime.

use alloc::format;
use alloc::string::{String, ToString};

use crate::{ContainerError, Result};

/// Value kind declared by a frame column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    String,
    Int64,
    Double,
    Boolean,
}

impl ValueKind {
    /// True for kinds stored as raw doubles
    pub const fn is_double(&self) -> bool {
        matches!(self, ValueKind::Double)
    }

    /// Parse a textual field into a cell of this kind
    pub fn parse_value(&self, text: &str) -> Result<CellValue> {
        match self {
            ValueKind::String => Ok(CellValue::String(text.to_string())),
            ValueKind::Int64 => text
                .trim()
                .parse::<i64>()
                .map(CellValue::Int64)
                .map_err(|_| ContainerError::ValueParse),
            ValueKind::Double => text
                .trim()
                .parse::<f64>()
                .map(CellValue::Double)
                .map_err(|_| ContainerError::ValueParse),
            ValueKind::Boolean => parse_bool(text.trim())
                .map(CellValue::Boolean)
                .ok_or(ContainerError::ValueParse),
        }
    }
}

impl core::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValueKind::String => write!(f, "STRING"),
            ValueKind::Int64 => write!(f, "INT"),
            ValueKind::Double => write!(f, "DOUBLE"),
            ValueKind::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

impl core::str::FromStr for ValueKind {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self> {
        let matches = |names: &[&str]| names.iter().any(|n| s.eq_ignore_ascii_case(n));
        if matches(&["STRING", "STR"]) {
            Ok(ValueKind::String)
        } else if matches(&["INT", "INT64"]) {
            Ok(ValueKind::Int64)
        } else if matches(&["DOUBLE", "FP64"]) {
            Ok(ValueKind::Double)
        } else if matches(&["BOOLEAN", "BOOL"]) {
            Ok(ValueKind::Boolean)
        } else {
            Err(ContainerError::ValueParse)
        }
    }
}

/// A single non-null frame cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    String(String),
    Int64(i64),
    Double(f64),
    Boolean(bool),
}

impl CellValue {
    /// Kind tag of this value
    pub const fn kind(&self) -> ValueKind {
        match self {
            CellValue::String(_) => ValueKind::String,
            CellValue::Int64(_) => ValueKind::Int64,
            CellValue::Double(_) => ValueKind::Double,
            CellValue::Boolean(_) => ValueKind::Boolean,
        }
    }
}

impl core::fmt::Display for CellValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Int64(v) => write!(f, "{v}"),
            CellValue::Double(v) => write!(f, "{}", double_to_text(*v)),
            CellValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// Plain decimal text for a double, integral values keep a `.0` suffix
pub fn double_to_text(value: f64) -> String {
    let text = format!("{value}");
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

/// Round half up to the nearest integer, saturating at the i64 range
pub fn round_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let shifted = value + 0.5;
    let truncated = shifted as i64;
    // `as` truncates toward zero, step down for negative fractions
    if (truncated as f64) > shifted {
        truncated - 1
    } else {
        truncated
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(
            ValueKind::Double.parse_value(" 2.5 "),
            Ok(CellValue::Double(2.5))
        );
        assert_eq!(ValueKind::Int64.parse_value("-7"), Ok(CellValue::Int64(-7)));
        assert_eq!(
            ValueKind::Boolean.parse_value("TRUE"),
            Ok(CellValue::Boolean(true))
        );
        assert_eq!(
            ValueKind::String.parse_value("abc"),
            Ok(CellValue::String("abc".to_string()))
        );

        assert_eq!(
            ValueKind::Double.parse_value("abc"),
            Err(ContainerError::ValueParse)
        );
        assert_eq!(
            ValueKind::Int64.parse_value("1.5"),
            Err(ContainerError::ValueParse)
        );
        assert_eq!(
            ValueKind::Boolean.parse_value("yes"),
            Err(ContainerError::ValueParse)
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(format!("{}", ValueKind::Double), "DOUBLE");
        assert_eq!(format!("{}", ValueKind::Int64), "INT");
        assert_eq!("boolean".parse::<ValueKind>(), Ok(ValueKind::Boolean));
        assert_eq!("STRING".parse::<ValueKind>(), Ok(ValueKind::String));
        assert!("complex".parse::<ValueKind>().is_err());
    }

    #[test]
    fn test_double_to_text() {
        assert_eq!(double_to_text(1.0), "1.0");
        assert_eq!(double_to_text(-3.0), "-3.0");
        assert_eq!(double_to_text(0.25), "0.25");
        assert_eq!(double_to_text(f64::NAN), "NaN");
    }

    #[test]
    fn test_round_to_i64() {
        assert_eq!(round_to_i64(2.4), 2);
        assert_eq!(round_to_i64(2.5), 3);
        assert_eq!(round_to_i64(-2.5), -2);
        assert_eq!(round_to_i64(-2.6), -3);
        assert_eq!(round_to_i64(f64::NAN), 0);
    }
}
