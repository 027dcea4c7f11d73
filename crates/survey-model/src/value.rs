//! Typed cell values.

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::numeric::format_numeric;

/// Canonical date rendering used for matching, hand-off and display.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A labeled categorical value.
///
/// `index` points into the level list declared on the owning column, so the
/// level order is a property of the schema rather than of the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub index: usize,
    pub label: String,
}

impl Level {
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }
}

/// A single cell in a [`RecordTable`](crate::RecordTable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Category(Level),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of integer and float cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Label of a categorical cell.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Value::Category(level) => Some(level.label.as_str()),
            _ => None,
        }
    }

    /// Canonical text of a non-missing cell.
    ///
    /// This is the form matched against categorical codes and synonym lists:
    /// integers and whole floats print without a fractional part, text is
    /// trimmed, dates use [`DATE_FORMAT`] and categories yield their label.
    pub fn raw_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Missing => None,
            Value::Integer(v) => Some(Cow::Owned(v.to_string())),
            Value::Float(v) => Some(Cow::Owned(format_numeric(*v))),
            Value::Text(s) => Some(Cow::Borrowed(s.trim())),
            Value::Date(d) => Some(Cow::Owned(d.format(DATE_FORMAT).to_string())),
            Value::Category(level) => Some(Cow::Borrowed(level.label.as_str())),
        }
    }

    /// Appends an exact, type-tagged identity of this cell to `out`.
    ///
    /// Two cells produce the same key only if they are the same variant with
    /// the same content; floats compare by bit pattern.
    pub fn write_key(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = match self {
            Value::Missing => write!(out, "M"),
            Value::Integer(v) => write!(out, "I{v}"),
            Value::Float(v) => write!(out, "F{:016x}", v.to_bits()),
            Value::Text(s) => write!(out, "T{}:{s}", s.len()),
            Value::Date(d) => write!(out, "D{}", d.format(DATE_FORMAT)),
            Value::Category(level) => write!(out, "C{}:{}", level.index, level.label),
        };
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str("NA"),
            Value::Text(s) => f.write_str(s),
            other => match other.raw_text() {
                Some(text) => f.write_str(&text),
                None => Ok(()),
            },
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}
