//! Result Records
//!
//! A `ResultRecord` is an ordered mapping from an adapter-defined column set to
//! values. Every column starts out either pre-filled (filename, query, fields
//! that do not apply to the chosen engine) or holding the `Unset` sentinel.
//! A record is valid only when no sentinel survives extraction.

use serde::Serialize;
use std::fmt;

/// Value of one record field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Not extracted yet (rendered as `-1`)
    Unset,
    /// Field does not apply to this engine or output (rendered as `-2`)
    NotApplicable,
    /// Raw text taken from engine output
    Text(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
}

impl FieldValue {
    /// True for the "not yet extracted" sentinel.
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unset => write!(f, "-1"),
            FieldValue::NotApplicable => write!(f, "-2"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

/// One output row, keyed by column name in column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    fields: Vec<(String, FieldValue)>,
}

impl ResultRecord {
    /// Record with `filename` and `query` empty and every other column unset.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = columns
            .into_iter()
            .map(Into::into)
            .map(|name| {
                let value = if name == "filename" || name == "query" {
                    FieldValue::Text(String::new())
                } else {
                    FieldValue::Unset
                };
                (name, value)
            })
            .collect();
        Self { fields }
    }

    /// Overwrite an initial value while building a template.
    pub fn preset(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a column. Names outside the schema are ignored; returns whether it was stored.
    pub fn set(&mut self, column: &str, value: impl Into<FieldValue>) -> bool {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Current value of a column.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Columns still holding the sentinel.
    pub fn missing_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, value)| value.is_unset())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// True when no column still holds the sentinel.
    pub fn is_valid(&self) -> bool {
        self.fields.iter().all(|(_, value)| !value.is_unset())
    }
}
