//! Validation error construction.
//!
//! Every failed check produces exactly one [`ValidationError`] whose message is
//! either the custom `$message` of the enclosing node or one of a small set of
//! templates. Construction never fails.

use conform_core::Datum;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Name of the rule whose failure message reads "No ... was provided".
pub const REQUIRED_RULE: &str = "required";

/// A value failed a ruleset.
///
/// `Display` yields the message; the other fields describe what failed.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable message
    pub message: String,
    /// Offending value, `None` when it was missing
    pub data: Option<Value>,
    /// Rule or expected type name
    pub rule: String,
    /// Field or key name
    pub property: String,
    /// Runtime type of the offending value (type mismatches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_type: Option<&'static str>,
}

impl ValidationError {
    /// Creates a type mismatch error.
    ///
    /// A non-empty `custom_message` is used verbatim. Otherwise the message
    /// reads `` `field` should be a number (instead of "blah", which is a string) ``,
    /// or `` `field` should be a number (instead of null) `` for `null`.
    pub fn type_mismatch(
        datum: Datum<'_>,
        expected: &str,
        field: &str,
        custom_message: Option<&str>,
    ) -> Self {
        let message = match custom_message.filter(|m| !m.is_empty()) {
            Some(custom) => custom.to_string(),
            None if datum.is_null() => {
                format!("`{field}` should be a {expected} (instead of null)")
            }
            None => format!(
                "`{field}` should be a {expected} (instead of {}, which is a {})",
                datum.render(),
                datum.type_name()
            ),
        };

        Self {
            message,
            data: datum.to_owned_value(),
            rule: expected.to_string(),
            property: field.to_string(),
            actual_type: Some(datum.type_name()),
        }
    }

    /// Creates a named rule failure.
    pub fn rule_failure(datum: Datum<'_>, rule: &str, field: &str) -> Self {
        let message = if rule == REQUIRED_RULE {
            format!("No {field} was provided. Please provide a {field}")
        } else {
            format!(
                "Invalid {field}. Input failed {rule} validation: {}",
                datum.render()
            )
        };

        Self {
            message,
            data: datum.to_owned_value(),
            rule: rule.to_string(),
            property: field.to_string(),
            actual_type: None,
        }
    }
}
