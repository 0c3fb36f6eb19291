use std::{fmt, time::Duration};

use serde_json::{Number, Value};

use crate::log::printf::display_string;

/// A typed value attached to a record under an explicit key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Rendered as fractional seconds.
    Duration(Duration),
}

/// Key/value pair rendered after the message text.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    /// Pairs `key` with an already-typed `value`.
    pub fn new(key: impl Into<String>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// String field, JSON-escaped on output.
    pub fn str(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    /// Signed integer field.
    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint(value))
    }

    /// Float field; NaN and infinities are written as strings.
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, FieldValue::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    /// Duration field, written as fractional seconds (`1.5` for 1500ms).
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    /// Stores the `Display` rendering of `value`, or `%!v(BADDISPLAY)` when
    /// that rendering fails.
    pub fn display(key: impl Into<String>, value: &dyn fmt::Display) -> Self {
        let rendered =
            display_string(value).unwrap_or_else(|| "%!v(BADDISPLAY)".to_owned());
        Self::str(key, rendered)
    }

    /// Best-effort fallback for types that only implement `Debug`.
    pub fn debug(key: impl Into<String>, value: &dyn fmt::Debug) -> Self {
        Self::str(key, format!("{value:?}"))
    }

    /// Conventional `"error"` field.
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::display("error", &err)
    }
}

impl FieldValue {
    pub(crate) fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Uint(u) => Value::from(*u),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Float(f) => float_to_json(*f),
            FieldValue::Duration(d) => float_to_json(d.as_secs_f64()),
        }
    }
}

/// JSON has no NaN or infinities, so those are rendered as strings.
fn float_to_json(f: f64) -> Value {
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None if f.is_nan() => Value::String("NaN".into()),
        None if f.is_sign_positive() => Value::String("+Inf".into()),
        None => Value::String("-Inf".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_as_fractional_seconds() {
        let f = Field::duration("elapsed", Duration::from_millis(1500));
        assert_eq!(f.value.to_json().to_string(), "1.5");
    }

    #[test]
    fn non_finite_floats_fall_back_to_strings() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), Value::from("NaN"));
        assert_eq!(FieldValue::Float(f64::INFINITY).to_json(), Value::from("+Inf"));
        assert_eq!(
            FieldValue::Float(f64::NEG_INFINITY).to_json(),
            Value::from("-Inf")
        );
    }

    #[test]
    fn debug_only_types_still_render() {
        #[derive(Debug)]
        struct Opaque(u8);
        let f = Field::debug("v", &Opaque(3));
        assert_eq!(f.value, FieldValue::Str("Opaque(3)".into()));
    }

    #[test]
    fn failing_display_is_replaced_by_a_marker() {
        struct Broken;
        impl fmt::Display for Broken {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Err(fmt::Error)
            }
        }
        let f = Field::display("v", &Broken);
        assert_eq!(f.value, FieldValue::Str("%!v(BADDISPLAY)".into()));
    }
}
