//! Rule registry.
//!
//! A registry maps rule names to predicates. It is an ordinary owned value:
//! each [`crate::Validator`] holds its own, and cloning one yields an
//! independent copy that later registrations on the original do not touch.

use crate::builtins;
use conform_core::{Datum, Predicate, Result, RuleLookup, RuleResult, SchemaError, ValidationContext};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Mapping from rule name to predicate.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Predicate>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in rule.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::install(&mut registry);
        registry
    }

    /// Registers a single rule.
    ///
    /// Re-registering a name replaces the previous predicate.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidDefinition`] if the name is empty or
    /// starts with `$`, which is reserved for schema keys.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<&mut Self>
    where
        F: Fn(Datum<'_>, &[Value], &ValidationContext) -> RuleResult + Send + Sync + 'static,
    {
        self.register_predicate(name, Arc::new(predicate))
    }

    /// Registers an already wrapped predicate.
    pub fn register_predicate(
        &mut self,
        name: impl Into<String>,
        predicate: Predicate,
    ) -> Result<&mut Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(SchemaError::invalid_definition(name));
        }
        debug!(rule = %name, "registering rule");
        self.insert(name, predicate);
        Ok(self)
    }

    /// Registers a batch of rules.
    ///
    /// Every entry is checked before anything is merged, so a rejected batch
    /// leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidDefinition`] naming the first rejected
    /// name.
    pub fn register_all<I, K>(&mut self, definitions: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, Predicate)>,
        K: Into<String>,
    {
        let definitions: Vec<(String, Predicate)> = definitions
            .into_iter()
            .map(|(name, predicate)| (name.into(), predicate))
            .collect();

        if let Some((name, _)) = definitions.iter().find(|(name, _)| !is_valid_name(name)) {
            return Err(SchemaError::invalid_definition(name.clone()));
        }

        debug!(count = definitions.len(), "registering rules");
        self.rules.extend(definitions);
        Ok(self)
    }

    /// Returns the predicate registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.rules.get(name)
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, predicate: Predicate) {
        self.rules.insert(name.into(), predicate);
    }
}

impl RuleLookup for RuleRegistry {
    fn lookup(&self, name: &str) -> Option<&Predicate> {
        self.rules.get(name)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.starts_with('$')
}
