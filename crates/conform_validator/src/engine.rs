//! Main validation engine.
//!
//! This module provides the `Validator` that checks a value against a
//! ruleset: the structural `type` node first, then each named rule in
//! declaration order.

use crate::{RuleRegistry, TypeMatcher, ValidationError, match_rule, type_matcher};
use conform_core::{Datum, Predicate, Result, RuleResult, Ruleset, ValidationContext};
use serde_json::Value;
use tracing::debug;

/// Outcome of validating one value: `Ok(())` or the first failure.
pub type Outcome = std::result::Result<(), ValidationError>;

/// Main validation engine.
///
/// Owns the rule registry it validates with. Configuration problems (unknown
/// rules, runaway recursion) are returned as the outer `Err`; data that does
/// not conform is reported through the inner [`Outcome`].
///
/// # Example
///
/// ```rust
/// use conform_core::{Ruleset, ValidationContext};
/// use conform_validator::Validator;
/// use serde_json::json;
///
/// let validator = Validator::new();
/// let ruleset = Ruleset::from_value(&json!({"type": "number"})).unwrap();
/// let context = ValidationContext::new().with_field_name("foo");
///
/// let outcome = validator.validate(&json!("blah"), &ruleset, &context).unwrap();
///
/// match outcome {
///     Ok(()) => println!("Validation passed!"),
///     Err(error) => assert_eq!(
///         error.to_string(),
///         "`foo` should be a number (instead of \"blah\", which is a string)"
///     ),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Validator {
    registry: RuleRegistry,
    max_depth: usize,
}

impl Validator {
    /// Creates a validator with the built-in rules.
    pub fn new() -> Self {
        Self::with_registry(RuleRegistry::with_builtins())
    }

    /// Creates a validator using `registry`.
    pub fn with_registry(registry: RuleRegistry) -> Self {
        Self {
            registry,
            max_depth: type_matcher::DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum recursion depth (default 50).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the rule registry.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Returns the rule registry for modification.
    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// Declares a custom rule usable as a `type` leaf or a named rule.
    ///
    /// Visible to every later validation through this validator.
    pub fn register_type<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<&mut Self>
    where
        F: Fn(Datum<'_>, &[Value], &ValidationContext) -> RuleResult + Send + Sync + 'static,
    {
        self.registry.register(name, predicate)?;
        Ok(self)
    }

    /// Declares several custom rules at once.
    ///
    /// Nothing is registered if any entry is rejected.
    pub fn register_types<I, K>(&mut self, definitions: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, Predicate)>,
        K: Into<String>,
    {
        self.registry.register_all(definitions)?;
        Ok(self)
    }

    /// Validates `data` against `ruleset`.
    ///
    /// This is the main validation entry point. The type node is checked
    /// first and its first failure, in depth-first declared-key order, is
    /// returned. Otherwise named rules run in order until one fails.
    ///
    /// # Arguments
    ///
    /// * `data` - The value to validate; `Datum::Missing` for no value
    /// * `ruleset` - The compiled ruleset
    /// * `context` - Field display name and extra values for predicates
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` for an unknown rule or when recursion exceeds
    /// the maximum depth.
    pub fn validate<'d>(
        &self,
        data: impl Into<Datum<'d>>,
        ruleset: &Ruleset,
        context: &ValidationContext,
    ) -> Result<Outcome> {
        let datum = data.into();

        if let Some(node) = &ruleset.type_node {
            let errors = self.type_matcher(context).match_type(
                datum,
                node,
                0,
                context.field_name(),
                None,
            )?;
            if let Some(first) = errors.into_iter().next() {
                debug!(rule = %first.rule, property = %first.property, "type check failed");
                return Ok(Err(first));
            }
        }

        for rule in &ruleset.rules {
            if let Some(error) = match_rule(&self.registry, datum, &rule.name, &rule.args, context)? {
                debug!(rule = %rule.name, "named rule failed");
                return Ok(Err(error));
            }
        }

        Ok(Ok(()))
    }

    /// Validates `data` and returns every type failure.
    ///
    /// The full list of type-walk failures comes first (every array element
    /// and every declared key is visited), followed by the first failing
    /// named rule, if any.
    pub fn validate_all<'d>(
        &self,
        data: impl Into<Datum<'d>>,
        ruleset: &Ruleset,
        context: &ValidationContext,
    ) -> Result<Vec<ValidationError>> {
        let datum = data.into();
        let mut errors = match &ruleset.type_node {
            Some(node) => self.type_matcher(context).match_type(
                datum,
                node,
                0,
                context.field_name(),
                None,
            )?,
            None => Vec::new(),
        };

        for rule in &ruleset.rules {
            if let Some(error) = match_rule(&self.registry, datum, &rule.name, &rule.args, context)? {
                errors.push(error);
                break;
            }
        }

        Ok(errors)
    }

    /// Returns true if `data` conforms to `ruleset`.
    pub fn is_valid<'d>(
        &self,
        data: impl Into<Datum<'d>>,
        ruleset: &Ruleset,
        context: &ValidationContext,
    ) -> Result<bool> {
        Ok(self.validate(data, ruleset, context)?.is_ok())
    }

    fn type_matcher<'a>(&'a self, context: &'a ValidationContext) -> TypeMatcher<'a, RuleRegistry> {
        TypeMatcher::new(&self.registry, context).with_max_depth(self.max_depth)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
