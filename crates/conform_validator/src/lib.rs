//! # conform validator
//!
//! Validation engine for conform rulesets. This crate provides:
//!
//! - A rule registry with the built-in rules (`required`, `max`, `url`, ...)
//! - Recursive type matching over arrays, objects, patterns and named leaves
//! - Named rule matching with declared arguments
//! - Deterministic, human-readable error messages
//!
//! ## Example
//!
//! ```rust
//! use conform_core::{Ruleset, ValidationContext};
//! use conform_validator::Validator;
//! use serde_json::json;
//!
//! let mut validator = Validator::new();
//! validator
//!     .register_type("five", |datum, _args, _ctx| Ok(datum.as_f64() == Some(5.0)))
//!     .unwrap();
//!
//! let ruleset = Ruleset::from_value(&json!({
//!     "type": {"houseNumber": "five", "tags": ["string"]}
//! }))
//! .unwrap();
//!
//! let outcome = validator
//!     .validate(&json!({"houseNumber": 5, "tags": ["a", "b"]}), &ruleset, &ValidationContext::new())
//!     .unwrap();
//!
//! if let Err(error) = outcome {
//!     println!("Validation failed: {error}");
//! }
//! ```

pub mod builtins;
mod engine;
mod error;
mod registry;
mod rule_matcher;
mod type_matcher;

pub use engine::*;
pub use error::*;
pub use registry::*;
pub use rule_matcher::*;
pub use type_matcher::*;
