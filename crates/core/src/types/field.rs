//! Upstream field shapes and their normalization.
//!
//! The e-depot API returns record fields either as plain strings or as small
//! wrapper objects carrying the real value under `v` (value) or `r` (raw).
//! Every field goes through [`normalize`] before it reaches a [`Company`].
//!
//! [`Company`]: crate::Company

use serde_json::Value;

/// Key holding the display value inside a wrapped field.
const VALUE_KEY: &str = "v";
/// Key holding the raw value inside a wrapped field.
const RAW_KEY: &str = "r";

/// A single upstream field as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawField {
    /// Missing, null, or otherwise falsy.
    #[default]
    Absent,
    /// A plain string value.
    Plain(String),
    /// An object carrying the value under `v` and/or `r`.
    Wrapped {
        /// The `v` entry, if it held a string.
        v: Option<String>,
        /// The `r` entry, if it held a string.
        r: Option<String>,
    },
}

impl RawField {
    /// Classify an optional JSON value.
    ///
    /// Null, `false`, `0` and the empty string are treated as absent. Objects
    /// become [`RawField::Wrapped`]; any other non-string value carries no
    /// usable text and normalizes to an empty string.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null | Value::Bool(false)) => Self::Absent,
            Some(Value::String(s)) if s.is_empty() => Self::Absent,
            Some(Value::String(s)) => Self::Plain(s.clone()),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Self::Absent,
            Some(Value::Object(map)) => Self::Wrapped {
                v: map.get(VALUE_KEY).and_then(Value::as_str).map(str::to_owned),
                r: map.get(RAW_KEY).and_then(Value::as_str).map(str::to_owned),
            },
            Some(_) => Self::Wrapped { v: None, r: None },
        }
    }

    /// Normalize this field into a string. See [`normalize`].
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize(self)
    }
}

impl From<&Value> for RawField {
    fn from(value: &Value) -> Self {
        Self::from_value(Some(value))
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Absent
        } else {
            Self::Plain(value.to_owned())
        }
    }
}

/// Normalize a raw field into a plain string.
///
/// Absent fields become `""`, plain strings are used as-is, and wrapped
/// fields yield the first non-empty of `v` then `r`, defaulting to `""`.
#[must_use]
pub fn normalize(field: &RawField) -> String {
    match field {
        RawField::Absent => String::new(),
        RawField::Plain(s) => s.clone(),
        RawField::Wrapped { v, r } => v
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| r.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_owned(),
    }
}
