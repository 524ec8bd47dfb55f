//! # conform core
//!
//! Core data structures for the conform validator.
//!
//! This crate provides the building blocks shared by the validation engine and
//! the ruleset loader. A ruleset is a declarative schema describing the shape
//! of a value (`type`) plus named scalar constraints (`required`, `max`, ...).
//!
//! ## Key Concepts
//!
//! - **Ruleset**: a compiled schema, an optional [`TypeNode`] tree plus
//!   ordered [`NamedRule`]s
//! - **Datum**: a borrowed view of the value under validation, which may be
//!   missing altogether
//! - **ValidationContext**: the field display name and extra values visible
//!   to predicates
//! - **Predicate / RuleLookup**: the seam through which the engine reads rules
//!
//! ## Example
//!
//! ```rust
//! use conform_core::{Ruleset, TypeNode};
//! use serde_json::json;
//!
//! let ruleset = Ruleset::from_value(&json!({
//!     "type": {
//!         "name": "string",
//!         "friends": [{"name": "string"}]
//!     }
//! }))
//! .unwrap();
//!
//! assert!(matches!(ruleset.type_node, Some(TypeNode::Object(_))));
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod rule;
pub mod schema;

pub use builder::*;
pub use context::*;
pub use error::*;
pub use rule::*;
pub use schema::*;
