//! Validation context and borrowed data handles.
//!
//! A [`ValidationContext`] is created once per top-level validation call and
//! passed by reference through the whole recursive walk. Predicates read it to
//! implement cross-field rules (for example comparing a password with its
//! confirmation); the engine itself never mutates it.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Display name used in messages when the context does not provide one.
pub const DEFAULT_FIELD_NAME: &str = "field";

/// A borrowed view of the value under validation.
///
/// `Missing` stands for a value that is absent altogether (an undeclared
/// object key, or no data at all). It is distinct from JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum<'a> {
    /// No value at all
    Missing,
    /// A present value, possibly `null`
    Present(&'a Value),
}

impl<'a> Datum<'a> {
    /// Returns the underlying value, if present.
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Datum::Missing => None,
            Datum::Present(value) => Some(value),
        }
    }

    /// Returns true if no value is present.
    pub fn is_missing(self) -> bool {
        matches!(self, Datum::Missing)
    }

    /// Returns true if the value is JSON `null`.
    pub fn is_null(self) -> bool {
        matches!(self, Datum::Present(Value::Null))
    }

    /// Attempts to get this value as a string.
    pub fn as_str(self) -> Option<&'a str> {
        self.value().and_then(Value::as_str)
    }

    /// Attempts to get this value as a JSON number.
    pub fn as_f64(self) -> Option<f64> {
        self.value().and_then(Value::as_f64)
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(self) -> Option<bool> {
        self.value().and_then(Value::as_bool)
    }

    /// Attempts to get this value as an array.
    pub fn as_array(self) -> Option<&'a Vec<Value>> {
        self.value().and_then(Value::as_array)
    }

    /// Attempts to get this value as an object.
    pub fn as_object(self) -> Option<&'a Map<String, Value>> {
        self.value().and_then(Value::as_object)
    }

    /// Returns the member `key` of an object value, or `Missing`.
    pub fn get(self, key: &str) -> Datum<'a> {
        self.as_object()
            .and_then(|map| map.get(key))
            .map_or(Datum::Missing, Datum::Present)
    }

    /// Returns the runtime type tag of this value.
    ///
    /// One of `undefined`, `null`, `boolean`, `number`, `string`, `array`,
    /// `object`.
    pub fn type_name(self) -> &'static str {
        match self {
            Datum::Missing => "undefined",
            Datum::Present(Value::Null) => "null",
            Datum::Present(Value::Bool(_)) => "boolean",
            Datum::Present(Value::Number(_)) => "number",
            Datum::Present(Value::String(_)) => "string",
            Datum::Present(Value::Array(_)) => "array",
            Datum::Present(Value::Object(_)) => "object",
        }
    }

    /// Renders the value as compact JSON for error messages.
    ///
    /// A missing value renders as `undefined`.
    pub fn render(self) -> String {
        match self {
            Datum::Missing => "undefined".to_string(),
            Datum::Present(value) => value.to_string(),
        }
    }

    /// Clones the underlying value, if present.
    pub fn to_owned_value(self) -> Option<Value> {
        self.value().cloned()
    }
}

impl<'a> From<&'a Value> for Datum<'a> {
    fn from(value: &'a Value) -> Self {
        Datum::Present(value)
    }
}

impl<'a> From<Option<&'a Value>> for Datum<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map_or(Datum::Missing, Datum::Present)
    }
}

/// Context for a single validation call.
///
/// Carries the human-readable name of the field under validation and any
/// extra values predicates may consult.
///
/// # Example
///
/// ```rust
/// use conform_core::ValidationContext;
/// use serde_json::json;
///
/// let context = ValidationContext::new()
///     .with_field_name("password")
///     .with_value("passwordConfirmation", json!("passW0rd"));
///
/// assert_eq!(context.field_name(), "password");
/// assert_eq!(context.get("passwordConfirmation").as_str(), Some("passW0rd"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationContext {
    /// Display name of the field under validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<String>,

    /// Extra values visible to predicates
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ValidationContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON object.
    ///
    /// The `validation` key becomes the display name; every other key is
    /// kept as an extra value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Sets the display name of the field under validation.
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.validation = Some(name.into());
        self
    }

    /// Adds an extra value to the context.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Returns the display name, defaulting to `field`.
    pub fn field_name(&self) -> &str {
        self.validation.as_deref().unwrap_or(DEFAULT_FIELD_NAME)
    }

    /// Returns the extra value stored under `key`.
    pub fn get(&self, key: &str) -> Datum<'_> {
        self.fields.get(key).into()
    }
}
