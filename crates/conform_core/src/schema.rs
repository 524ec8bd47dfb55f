//! Ruleset data structures.
//!
//! A ruleset is compiled once into a typed tree. The type matcher then
//! dispatches on [`TypeNode`] variants instead of probing the shape of raw
//! values on every call.
//!
//! ## JSON form
//!
//! | JSON                                   | node                         |
//! |----------------------------------------|------------------------------|
//! | `"string"`                             | [`TypeNode::Rule`]           |
//! | `[]`                                   | [`TypeNode::AnyArray`]       |
//! | `{}`                                   | [`TypeNode::AnyObject`]      |
//! | `["string"]`                           | [`TypeNode::Plural`]         |
//! | `{"name": "string"}`                   | [`TypeNode::Object`]         |
//! | `{"$pattern": "^a+$"}`                 | [`TypeNode::Pattern`]        |
//! | `{"$validate": ..., "$message": "…"}`  | [`TypeNode::Annotated`]      |

use crate::{Result, SchemaError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Reserved key holding the node to apply instead of the surrounding mapping.
pub const VALIDATE_KEY: &str = "$validate";

/// Reserved key holding a custom error message.
pub const MESSAGE_KEY: &str = "$message";

/// Reserved key holding a regular expression source.
pub const PATTERN_KEY: &str = "$pattern";

/// Ruleset key holding the structural type node.
pub const TYPE_KEY: &str = "type";

/// Deepest nesting accepted when compiling a type node.
pub const MAX_SCHEMA_DEPTH: usize = 256;

/// A node of a compiled ruleset tree.
#[derive(Debug, Clone)]
pub enum TypeNode {
    /// Named leaf rule resolved through the rule registry
    Rule(String),
    /// Any array
    AnyArray,
    /// Any object (arrays excluded)
    AnyObject,
    /// Text matching a regular expression
    Pattern(Regex),
    /// Every element of an array must match the inner node
    Plural(Box<TypeNode>),
    /// Each declared key must match its node, in declaration order
    Object(Vec<(String, TypeNode)>),
    /// Inner node whose failures report a custom message
    Annotated {
        /// Node to apply
        node: Box<TypeNode>,
        /// Message replacing the synthesized one
        message: String,
    },
}

impl TypeNode {
    /// Creates a named rule node.
    pub fn rule(name: impl Into<String>) -> Self {
        Self::Rule(name.into())
    }

    /// Compiles a pattern node.
    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Self::Pattern)
            .map_err(|e| SchemaError::InvalidPattern {
                pattern: source.to_string(),
                error: e.to_string(),
            })
    }

    /// Creates a plural node.
    pub fn plural(node: TypeNode) -> Self {
        Self::Plural(Box::new(node))
    }

    /// Creates an object node from `(key, node)` pairs.
    ///
    /// An empty field list yields [`TypeNode::AnyObject`].
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, TypeNode)>,
        K: Into<String>,
    {
        let fields: Vec<_> = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        if fields.is_empty() {
            Self::AnyObject
        } else {
            Self::Object(fields)
        }
    }

    /// Wraps a node with a custom error message.
    pub fn annotated(node: TypeNode, message: impl Into<String>) -> Self {
        Self::Annotated {
            node: Box::new(node),
            message: message.into(),
        }
    }

    /// Returns the name used for this node in error messages.
    pub fn expected_name(&self) -> Cow<'_, str> {
        match self {
            TypeNode::Rule(name) => Cow::Borrowed(name),
            TypeNode::AnyArray | TypeNode::Plural(_) => Cow::Borrowed("array"),
            TypeNode::AnyObject | TypeNode::Object(_) => Cow::Borrowed("object"),
            TypeNode::Pattern(regex) => Cow::Owned(format!("/{}/", regex.as_str())),
            TypeNode::Annotated { node, .. } => node.expected_name(),
        }
    }

    /// Returns true for nodes checked directly against the datum.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            TypeNode::Rule(_) | TypeNode::AnyArray | TypeNode::AnyObject | TypeNode::Pattern(_)
        )
    }

    /// Compiles a node from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::PluralArity`] for arrays with more than one
    /// element, [`SchemaError::InvalidPattern`] for bad `$pattern` sources and
    /// [`SchemaError::InvalidRuleset`] for values that are not nodes.
    /// Nesting deeper than [`MAX_SCHEMA_DEPTH`] returns
    /// [`SchemaError::DepthExceeded`].
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::compile(value, 0)
    }

    fn compile(value: &Value, depth: usize) -> Result<Self> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(SchemaError::DepthExceeded {
                max_depth: MAX_SCHEMA_DEPTH,
            });
        }

        match value {
            Value::String(name) => Ok(Self::Rule(name.clone())),
            Value::Array(items) => match items.as_slice() {
                [] => Ok(Self::AnyArray),
                [inner] => Ok(Self::plural(Self::compile(inner, depth + 1)?)),
                _ => Err(SchemaError::PluralArity(items.len())),
            },
            Value::Object(map) => Self::from_map(map, depth),
            other => Err(SchemaError::invalid_ruleset(format!(
                "expected a rule name, array or object, found {other}"
            ))),
        }
    }

    fn from_map(map: &Map<String, Value>, depth: usize) -> Result<Self> {
        if let Some(source) = map.get(PATTERN_KEY) {
            let source = source.as_str().ok_or_else(|| {
                SchemaError::invalid_ruleset(format!("`{PATTERN_KEY}` must be a string"))
            })?;
            if map.len() > 1 {
                return Err(SchemaError::invalid_ruleset(format!(
                    "`{PATTERN_KEY}` cannot be combined with other keys"
                )));
            }
            return Self::pattern(source);
        }

        let message = match map.get(MESSAGE_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) if message.is_empty() => None,
            Some(Value::String(message)) => Some(message.clone()),
            Some(other) => {
                return Err(SchemaError::invalid_ruleset(format!(
                    "`{MESSAGE_KEY}` must be a string, found {other}"
                )));
            }
        };

        let node = match map.get(VALIDATE_KEY) {
            Some(sub_validation) => {
                if let Some(key) = map.keys().find(|k| !is_reserved(k)) {
                    return Err(SchemaError::invalid_ruleset(format!(
                        "`{VALIDATE_KEY}` cannot be combined with field `{key}`"
                    )));
                }
                Self::from_sub_validation(sub_validation, depth + 1)?
            }
            None => Self::object(
                map.iter()
                    .filter(|(key, _)| !is_reserved(key))
                    .map(|(key, node)| Ok((key.clone(), Self::compile(node, depth + 1)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(match message {
            Some(message) => Self::annotated(node, message),
            None => node,
        })
    }

    // `{ "$validate": { "type": x } }` reads like a nested ruleset; unwrap it.
    fn from_sub_validation(value: &Value, depth: usize) -> Result<Self> {
        match value.as_object() {
            Some(map) if map.len() == 1 && map.contains_key(TYPE_KEY) => {
                Self::compile(&map[TYPE_KEY], depth)
            }
            _ => Self::compile(value, depth),
        }
    }
}

// Patterns compare by source; `Regex` has no equality of its own.
impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeNode::Rule(a), TypeNode::Rule(b)) => a == b,
            (TypeNode::AnyArray, TypeNode::AnyArray) => true,
            (TypeNode::AnyObject, TypeNode::AnyObject) => true,
            (TypeNode::Pattern(a), TypeNode::Pattern(b)) => a.as_str() == b.as_str(),
            (TypeNode::Plural(a), TypeNode::Plural(b)) => a == b,
            (TypeNode::Object(a), TypeNode::Object(b)) => a == b,
            (
                TypeNode::Annotated { node: a, message: m },
                TypeNode::Annotated { node: b, message: n },
            ) => m == n && a == b,
            _ => false,
        }
    }
}

fn is_reserved(key: &str) -> bool {
    key == VALIDATE_KEY || key == MESSAGE_KEY
}

/// A named, non-structural rule and its declared argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRule {
    /// Registry name of the rule
    pub name: String,
    /// Declared argument, passed to the predicate unchanged
    pub args: Value,
}

impl NamedRule {
    /// Creates a new named rule.
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// A complete top-level ruleset.
///
/// The optional type node is checked first, then every named rule in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ruleset {
    /// Structural type node (`type` key)
    pub type_node: Option<TypeNode>,
    /// Named rules in declaration order
    pub rules: Vec<NamedRule>,
}

impl Ruleset {
    /// Creates an empty ruleset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ruleset with only a type node.
    pub fn of_type(node: TypeNode) -> Self {
        Self {
            type_node: Some(node),
            rules: Vec::new(),
        }
    }

    /// Compiles a ruleset from its JSON form.
    ///
    /// # Example
    ///
    /// ```rust
    /// use conform_core::Ruleset;
    /// use serde_json::json;
    ///
    /// let ruleset = Ruleset::from_value(&json!({
    ///     "type": "integer",
    ///     "required": true,
    ///     "max": 24
    /// }))
    /// .unwrap();
    ///
    /// assert!(ruleset.type_node.is_some());
    /// assert_eq!(ruleset.rules.len(), 2);
    /// assert_eq!(ruleset.rules[1].name, "max");
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            SchemaError::invalid_ruleset(format!("a ruleset must be an object, found {value}"))
        })?;

        let mut ruleset = Self::new();
        for (key, entry) in map {
            if key == TYPE_KEY {
                ruleset.type_node = Some(TypeNode::from_value(entry)?);
            } else {
                ruleset.rules.push(NamedRule::new(key.clone(), entry.clone()));
            }
        }

        Ok(ruleset)
    }

    /// Returns true if the ruleset checks nothing.
    pub fn is_empty(&self) -> bool {
        self.type_node.is_none() && self.rules.is_empty()
    }
}
