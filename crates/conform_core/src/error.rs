//! Error types for ruleset configuration.
//!
//! Everything in this module signals a broken ruleset or rule registry, never
//! bad data. Data that fails a ruleset is reported through the validator's
//! `ValidationError` instead, so the two can't be confused by a caller.

use thiserror::Error;

/// Result type for ruleset and registry operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Configuration error raised while compiling or applying a ruleset.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A ruleset names a rule that is not registered
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// A plural (`[schema]`) node declared more than one element
    #[error("[] (or schema) rules can contain only one item, found {0}")]
    PluralArity(usize),

    /// A single rule definition was rejected
    #[error("Definition error: \"{0}\" is not a valid definition.")]
    InvalidDefinition(String),

    /// Recursion went past the configured maximum depth
    #[error(
        "Exceeded maximum depth ({max_depth}) when validating object. Maybe it's recursively referencing itself?"
    )]
    DepthExceeded {
        /// Depth limit that was exceeded
        max_depth: usize,
    },

    /// A `$pattern` node could not be compiled
    #[error("Invalid pattern '{pattern}': {error}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Compiler error
        error: String,
    },

    /// A ruleset value has a shape the compiler does not understand
    #[error("Invalid ruleset: {0}")]
    InvalidRuleset(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchemaError {
    /// Creates a new unknown rule error.
    pub fn unknown_rule(name: impl Into<String>) -> Self {
        Self::UnknownRule(name.into())
    }

    /// Creates a new invalid definition error.
    pub fn invalid_definition(name: impl Into<String>) -> Self {
        Self::InvalidDefinition(name.into())
    }

    /// Creates a new invalid ruleset error.
    pub fn invalid_ruleset(message: impl Into<String>) -> Self {
        Self::InvalidRuleset(message.into())
    }

    /// Returns true if this error came from the depth guard.
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. })
    }
}
