//! Builder pattern for creating rulesets.
//!
//! This module provides ergonomic builders for constructing rulesets in code,
//! as an alternative to compiling them from JSON.

use crate::{NamedRule, Ruleset, TypeNode};
use serde_json::Value;

/// Builder for creating a `Ruleset`.
///
/// # Example
///
/// ```rust
/// use conform_core::{ObjectBuilder, RulesetBuilder, TypeNode};
/// use serde_json::json;
///
/// let ruleset = RulesetBuilder::new()
///     .type_node(
///         ObjectBuilder::new()
///             .field("name", TypeNode::rule("string"))
///             .field("tags", TypeNode::plural(TypeNode::rule("string")))
///             .build(),
///     )
///     .rule("required", json!(true))
///     .build();
///
/// assert_eq!(ruleset.rules.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RulesetBuilder {
    type_node: Option<TypeNode>,
    rules: Vec<NamedRule>,
}

impl RulesetBuilder {
    /// Creates a new, empty ruleset builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the structural type node.
    pub fn type_node(mut self, node: TypeNode) -> Self {
        self.type_node = Some(node);
        self
    }

    /// Sets the type node to a named rule.
    pub fn type_rule(self, name: impl Into<String>) -> Self {
        self.type_node(TypeNode::rule(name))
    }

    /// Appends a named rule with its declared argument.
    pub fn rule(mut self, name: impl Into<String>, args: Value) -> Self {
        self.rules.push(NamedRule::new(name, args));
        self
    }

    /// Builds the ruleset.
    pub fn build(self) -> Ruleset {
        Ruleset {
            type_node: self.type_node,
            rules: self.rules,
        }
    }
}

/// Builder for an object type node.
///
/// Building with no fields yields [`TypeNode::AnyObject`], the same as `{}`.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    fields: Vec<(String, TypeNode)>,
    message: Option<String>,
}

impl ObjectBuilder {
    /// Creates a new object builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field and its node.
    pub fn field(mut self, key: impl Into<String>, node: TypeNode) -> Self {
        self.fields.push((key.into(), node));
        self
    }

    /// Sets a custom message for failures below this node.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Builds the node.
    pub fn build(self) -> TypeNode {
        let node = TypeNode::object(self.fields);
        match self.message {
            Some(message) => TypeNode::annotated(node, message),
            None => node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ruleset_builder() {
        let ruleset = RulesetBuilder::new()
            .type_rule("integer")
            .rule("min", json!(0))
            .rule("max", json!(24))
            .build();

        assert!(matches!(ruleset.type_node, Some(TypeNode::Rule(ref n)) if n == "integer"));
        assert_eq!(
            ruleset.rules,
            vec![NamedRule::new("min", json!(0)), NamedRule::new("max", json!(24))]
        );
    }

    #[test]
    fn test_empty_object_builder_is_any_object() {
        assert!(matches!(ObjectBuilder::new().build(), TypeNode::AnyObject));
    }

    #[test]
    fn test_object_builder_with_message() {
        let node = ObjectBuilder::new()
            .field("id", TypeNode::rule("numeric"))
            .message("oops1")
            .build();

        let TypeNode::Annotated { node, message } = node else {
            panic!("expected annotated node");
        };
        assert_eq!(message, "oops1");
        assert!(matches!(*node, TypeNode::Object(ref fields) if fields.len() == 1));
    }
}
