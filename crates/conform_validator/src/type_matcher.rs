//! Recursive type matching.
//!
//! Walks a [`TypeNode`] tree and a value in lockstep, depth first and in
//! declared key order. Leaf nodes are checked against the rule registry;
//! composite nodes descend into array elements or object members.
//!
//! Every failure found along the walk is collected. Callers that report a
//! single error take the first one.

use crate::{ValidationError, rule_matcher};
use conform_core::{Datum, Result, RuleLookup, SchemaError, TypeNode, ValidationContext};
use tracing::trace;

/// Default maximum recursion depth.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Rule used for pattern leaves when the datum is not text.
const STRING_RULE: &str = "string";

/// Matches values against type nodes.
pub struct TypeMatcher<'a, L: ?Sized> {
    rules: &'a L,
    context: &'a ValidationContext,
    max_depth: usize,
}

impl<'a, L> TypeMatcher<'a, L>
where
    L: RuleLookup + ?Sized,
{
    /// Creates a matcher reading rules from `rules`.
    pub fn new(rules: &'a L, context: &'a ValidationContext) -> Self {
        Self {
            rules,
            context,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum recursion depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Matches `datum` against `node`.
    ///
    /// # Arguments
    ///
    /// * `datum` - The value at this position
    /// * `node` - The node to match
    /// * `depth` - Current depth, `0` at the top
    /// * `key_name` - Field name reported by leaf failures
    /// * `custom_message` - Message inherited from an enclosing `$message`
    ///
    /// # Returns
    ///
    /// Every failure below this node, in walk order. Empty on success.
    ///
    /// # Errors
    ///
    /// Configuration problems are returned as [`SchemaError`]: an unknown
    /// rule name, or recursion past the maximum depth.
    pub fn match_type(
        &self,
        datum: Datum<'_>,
        node: &TypeNode,
        depth: usize,
        key_name: &str,
        custom_message: Option<&str>,
    ) -> Result<Vec<ValidationError>> {
        if depth > self.max_depth {
            return Err(SchemaError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        trace!(depth, key = key_name, expected = %node.expected_name(), "matching type node");

        let passed = match node {
            TypeNode::Plural(inner) => {
                return self.match_plural(datum, inner, depth, key_name, custom_message);
            }
            TypeNode::Object(fields) => {
                return self.match_object(datum, fields, depth, custom_message);
            }
            TypeNode::Annotated { node, message } => {
                return self.match_type(datum, node, depth, key_name, Some(message.as_str()));
            }
            TypeNode::AnyArray => datum.as_array().is_some(),
            TypeNode::AnyObject => datum.as_object().is_some(),
            TypeNode::Pattern(regex) => match datum.as_str() {
                Some(text) => regex.is_match(text),
                None => self.evaluate(STRING_RULE, datum)?,
            },
            TypeNode::Rule(name) => self.evaluate(name, datum)?,
        };

        if passed {
            Ok(Vec::new())
        } else {
            Ok(vec![ValidationError::type_mismatch(
                datum,
                &node.expected_name(),
                key_name,
                custom_message,
            )])
        }
    }

    fn match_plural(
        &self,
        datum: Datum<'_>,
        inner: &TypeNode,
        depth: usize,
        key_name: &str,
        custom_message: Option<&str>,
    ) -> Result<Vec<ValidationError>> {
        let Some(items) = datum.as_array() else {
            return Ok(vec![ValidationError::type_mismatch(
                datum,
                "array",
                key_name,
                custom_message,
            )]);
        };

        let mut errors = Vec::new();
        for item in items {
            errors.extend(self.match_type(
                Datum::Present(item),
                inner,
                depth + 1,
                key_name,
                custom_message,
            )?);
        }
        Ok(errors)
    }

    fn match_object(
        &self,
        datum: Datum<'_>,
        fields: &[(String, TypeNode)],
        depth: usize,
        custom_message: Option<&str>,
    ) -> Result<Vec<ValidationError>> {
        let mut errors = Vec::new();
        for (key, node) in fields {
            // Shallow data is reported, not descended into.
            if datum.as_object().is_none() {
                errors.push(ValidationError::type_mismatch(
                    datum,
                    "object",
                    key,
                    custom_message,
                ));
                continue;
            }
            errors.extend(self.match_type(datum.get(key), node, depth + 1, key, custom_message)?);
        }
        Ok(errors)
    }

    fn evaluate(&self, rule_name: &str, datum: Datum<'_>) -> Result<bool> {
        let predicate = self
            .rules
            .lookup(rule_name)
            .ok_or_else(|| SchemaError::unknown_rule(rule_name))?;

        Ok(rule_matcher::invoke(predicate, rule_name, datum, &[], self.context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleRegistry;
    use conform_core::RuleError;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn run(value: &Value, schema: Value) -> Result<Vec<ValidationError>> {
        let registry = RuleRegistry::with_builtins();
        let context = ValidationContext::new();
        let node = TypeNode::from_value(&schema)?;
        TypeMatcher::new(&registry, &context).match_type(
            Datum::from(value),
            &node,
            0,
            "field",
            None,
        )
    }

    #[test]
    fn test_primitive_match() {
        assert!(run(&json!("a"), json!("string")).unwrap().is_empty());

        let errors = run(&json!(1), json!("string")).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "string");
        assert_eq!(errors[0].actual_type, Some("number"));
    }

    #[test]
    fn test_empty_markers() {
        assert!(run(&json!([]), json!([])).unwrap().is_empty());
        assert_eq!(run(&json!({}), json!([])).unwrap()[0].rule, "array");
        assert!(run(&json!({"a": 1}), json!({})).unwrap().is_empty());
        assert_eq!(run(&json!([1]), json!({})).unwrap()[0].rule, "object");
    }

    #[test]
    fn test_object_descends_in_declared_order() {
        let errors = run(
            &json!({"name": 1, "age": "old"}),
            json!({"name": "string", "age": "number"}),
        )
        .unwrap();

        let properties: Vec<_> = errors.iter().map(|e| e.property.as_str()).collect();
        assert_eq!(properties, vec!["name", "age"]);
    }

    #[test]
    fn test_missing_member_is_undefined() {
        let errors = run(&json!({}), json!({"name": "string"})).unwrap();
        assert_eq!(errors[0].actual_type, Some("undefined"));
        assert_eq!(errors[0].data, None);
    }

    #[test]
    fn test_shallow_data_reports_object_error() {
        let errors = run(&json!("flat"), json!({"name": "string", "age": "number"})).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].rule, "object");
        assert_eq!(errors[0].property, "name");
        assert_eq!(errors[0].data, Some(json!("flat")));
    }

    #[test]
    fn test_plural_collects_every_element() {
        let errors = run(
            &json!([{"name": "a"}, {"name": 2}, {"name": 3}]),
            json!([{"name": "string"}]),
        )
        .unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].data, Some(json!(2)));
        assert_eq!(errors[1].data, Some(json!(3)));
    }

    #[test]
    fn test_plural_against_non_array() {
        let errors = run(&json!({"name": "a"}), json!([{"name": "string"}])).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "array");
    }

    #[test]
    fn test_pattern_on_non_text_fails_cleanly() {
        assert!(run(&json!("aaa"), json!({"$pattern": "^a+$"})).unwrap().is_empty());

        let errors = run(&json!("abc"), json!({"$pattern": "^a+$"})).unwrap();
        assert_eq!(errors[0].rule, "/^a+$/");

        let errors = run(&json!(42), json!({"$pattern": "^a+$"})).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].actual_type, Some("number"));
    }

    #[test]
    fn test_custom_message_reaches_nested_leaves() {
        let errors = run(
            &json!({"profile": {"age": "x"}}),
            json!({"profile": {"$validate": {"age": "number"}, "$message": "bad profile"}}),
        )
        .unwrap();

        assert_eq!(errors[0].message, "bad profile");
        assert_eq!(errors[0].property, "age");
    }

    #[test]
    fn test_innermost_message_wins() {
        let errors = run(
            &json!({"a": {"b": 1}}),
            json!({
                "$message": "outer",
                "a": {"$message": "inner", "b": "string"}
            }),
        )
        .unwrap();
        assert_eq!(errors[0].message, "inner");
    }

    #[test]
    fn test_unknown_rule_is_fatal() {
        let err = run(&json!({"a": 1}), json!({"a": "five"})).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownRule(ref n) if n == "five"));
    }

    #[test]
    fn test_predicate_error_becomes_validation_error() {
        let mut registry = RuleRegistry::new();
        registry
            .register("explodes", |_, _, _| Err(RuleError::new("boom")))
            .unwrap();
        let context = ValidationContext::new();

        let errors = TypeMatcher::new(&registry, &context)
            .match_type(
                Datum::from(&json!(1)),
                &TypeNode::rule("explodes"),
                0,
                "x",
                Some("custom"),
            )
            .unwrap();

        assert_eq!(errors[0].message, "custom");
        assert_eq!(errors[0].rule, "explodes");
    }

    #[test]
    fn test_panicking_predicate_becomes_validation_error() {
        let mut registry = RuleRegistry::new();
        registry
            .register("firstCharUpper", |datum, _, _| {
                let text = datum.as_str().unwrap();
                Ok(text.chars().next().is_some_and(char::is_uppercase))
            })
            .unwrap();
        let context = ValidationContext::new();
        let node = TypeNode::from_value(&json!({"initial": "firstCharUpper"})).unwrap();

        let errors = TypeMatcher::new(&registry, &context)
            .match_type(Datum::from(&json!({"initial": 5})), &node, 0, "field", None)
            .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "firstCharUpper");
        assert_eq!(errors[0].property, "initial");
        assert_eq!(errors[0].actual_type, Some("number"));
    }

    #[test]
    fn test_depth_limit() {
        let mut schema = json!("string");
        let mut value = json!("leaf");
        for _ in 0..60 {
            schema = json!({ "next": schema });
            value = json!({ "next": value });
        }

        let err = run(&value, schema).unwrap_err();
        assert!(err.is_depth_exceeded());
    }

    #[test]
    fn test_depth_within_limit() {
        let mut schema = json!("string");
        let mut value = json!("leaf");
        for _ in 0..DEFAULT_MAX_DEPTH {
            schema = json!({ "next": schema });
            value = json!({ "next": value });
        }

        assert!(run(&value, schema).unwrap().is_empty());
    }

    #[test]
    fn test_custom_max_depth() {
        let registry = RuleRegistry::with_builtins();
        let context = ValidationContext::new();
        let node = TypeNode::from_value(&json!([["number"]])).unwrap();

        let err = TypeMatcher::new(&registry, &context)
            .with_max_depth(1)
            .match_type(Datum::from(&json!([[1]])), &node, 0, "field", None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::DepthExceeded { max_depth: 1 }));
    }
}
