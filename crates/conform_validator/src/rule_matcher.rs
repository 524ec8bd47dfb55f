//! Named rule matching.
//!
//! Adapts a declared `name: args` pair from a ruleset into a single predicate
//! call and turns a failed outcome into a [`ValidationError`].

use crate::ValidationError;
use conform_core::{Datum, Predicate, Result, RuleLookup, SchemaError, ValidationContext};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Builds the argument list a named rule's predicate receives.
///
/// The declared value is always the single argument. Arrays are not spread,
/// so `in: ["a", "b"]` reaches the predicate as one array argument, the same
/// shape `max: 3` has.
pub fn rule_args(declared: &Value) -> &[Value] {
    std::slice::from_ref(declared)
}

/// Calls `predicate` and reduces its outcome to pass or fail.
///
/// A predicate that returns an error or panics counts as a failure.
pub(crate) fn invoke(
    predicate: &Predicate,
    rule_name: &str,
    datum: Datum<'_>,
    args: &[Value],
    context: &ValidationContext,
) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| predicate(datum, args, context))) {
        Ok(Ok(passed)) => passed,
        Ok(Err(err)) => {
            debug!(rule = rule_name, error = %err, "rule predicate failed to evaluate");
            false
        }
        Err(_) => {
            debug!(rule = rule_name, "rule predicate panicked");
            false
        }
    }
}

/// Matches `datum` against the named rule `rule_name`.
///
/// Returns `Ok(None)` when the rule passes and `Ok(Some(error))` when it
/// fails. A predicate that returns an error or panics counts as a failure.
///
/// # Errors
///
/// Returns [`SchemaError::UnknownRule`] if `rule_name` is not registered.
pub fn match_rule<L>(
    rules: &L,
    datum: Datum<'_>,
    rule_name: &str,
    declared: &Value,
    context: &ValidationContext,
) -> Result<Option<ValidationError>>
where
    L: RuleLookup + ?Sized,
{
    let predicate = rules
        .lookup(rule_name)
        .ok_or_else(|| SchemaError::unknown_rule(rule_name))?;

    if invoke(predicate, rule_name, datum, rule_args(declared), context) {
        Ok(None)
    } else {
        Ok(Some(ValidationError::rule_failure(
            datum,
            rule_name,
            context.field_name(),
        )))
    }
}
