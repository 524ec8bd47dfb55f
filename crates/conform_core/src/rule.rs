//! Predicate types and the rule lookup seam.
//!
//! The validation engine does not own any rules. It reads them through
//! [`RuleLookup`], which the validator crate implements for its registry.

use crate::{Datum, ValidationContext};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a predicate that could not evaluate its input.
///
/// The engine treats it as a failed check, never as a fatal error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct RuleError(String);

impl RuleError {
    /// Creates a new rule error.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Outcome of a single predicate evaluation.
pub type RuleResult = Result<bool, RuleError>;

/// A named rule: `(datum, declared arguments, context) -> passed`.
///
/// Leaf type checks call predicates with no arguments; named rules receive
/// their declared value as the single argument.
pub type Predicate =
    Arc<dyn Fn(Datum<'_>, &[Value], &ValidationContext) -> RuleResult + Send + Sync>;

/// Wraps a closure or function as a [`Predicate`].
///
/// # Example
///
/// ```rust
/// use conform_core::{predicate, Datum, ValidationContext};
/// use serde_json::json;
///
/// let is_five = predicate(|datum, _args, _ctx| Ok(datum.as_f64() == Some(5.0)));
/// let five = json!(5);
///
/// assert_eq!(is_five(Datum::from(&five), &[], &ValidationContext::new()), Ok(true));
/// ```
pub fn predicate<F>(f: F) -> Predicate
where
    F: Fn(Datum<'_>, &[Value], &ValidationContext) -> RuleResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Read access to a set of named predicates.
pub trait RuleLookup {
    /// Returns the predicate registered under `name`.
    fn lookup(&self, name: &str) -> Option<&Predicate>;

    /// Returns true if `name` is registered.
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl RuleLookup for std::collections::HashMap<String, Predicate> {
    fn lookup(&self, name: &str) -> Option<&Predicate> {
        self.get(name)
    }
}
