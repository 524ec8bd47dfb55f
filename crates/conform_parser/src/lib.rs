//! Parser for conform rulesets (JSON/YAML/TOML formats).
//!
//! This module loads rulesets written as JSON, YAML or TOML documents and
//! compiles them into the typed [`Ruleset`] tree. Every format is first read
//! into a JSON value, so a ruleset means the same thing whatever it was
//! written in.
//!
//! # Example
//!
//! ```rust
//! use conform_parser::parse_yaml;
//!
//! let yaml = r#"
//! type:
//!   name: string
//!   tags: [string]
//! required: true
//! "#;
//!
//! let ruleset = parse_yaml(yaml).expect("Failed to parse ruleset");
//! assert!(ruleset.type_node.is_some());
//! assert_eq!(ruleset.rules[0].name, "required");
//! ```

use conform_core::{Ruleset, SchemaError};
use serde_json::{Map, Number, Value};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading a ruleset.
#[derive(Debug, Error)]
pub enum ParserError {
    /// YAML parsing failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// TOML parsing failed
    #[error("Failed to parse TOML: {0}")]
    TomlError(String),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The document parsed but is not a valid ruleset
    #[error("Invalid ruleset: {0}")]
    SchemaError(#[from] SchemaError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Unsupported file format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid file extension
    #[error("Invalid or missing file extension")]
    InvalidExtension,
}

/// Result type alias for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Supported ruleset file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesetFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yml, .yaml)
    Yaml,
    /// TOML format (.toml)
    Toml,
}

/// Parse a ruleset from a JSON string.
///
/// # Example
///
/// ```rust
/// use conform_parser::parse_json;
///
/// let ruleset = parse_json(r#"{"type": "number", "max": 24}"#).unwrap();
/// assert_eq!(ruleset.rules.len(), 1);
/// ```
pub fn parse_json(content: &str) -> Result<Ruleset> {
    let value: Value = serde_json::from_str(content)?;
    compile(&value)
}

/// Parse a ruleset from a YAML string.
///
/// # Arguments
///
/// * `content` - The YAML string to parse
pub fn parse_yaml(content: &str) -> Result<Ruleset> {
    let value: Value = serde_yaml_ng::from_str(content)?;
    compile(&value)
}

/// Parse a ruleset from a TOML string.
///
/// TOML datetimes become RFC 3339 strings. Keys starting with `$` must be
/// quoted, e.g. `"$pattern" = "^a+$"`.
///
/// # Example
///
/// ```rust
/// use conform_parser::parse_toml;
///
/// let toml = r#"
/// required = true
///
/// [type]
/// name = "string"
/// tags = ["string"]
/// "#;
///
/// let ruleset = parse_toml(toml).unwrap();
/// assert_eq!(ruleset.rules[0].name, "required");
/// ```
pub fn parse_toml(content: &str) -> Result<Ruleset> {
    let table: toml::Table =
        toml::from_str(content).map_err(|e| ParserError::TomlError(e.to_string()))?;
    let value = toml_to_json(toml::Value::Table(table))?;
    compile(&value)
}

/// Parse a ruleset from a string in the given format.
pub fn parse_str(content: &str, format: RulesetFormat) -> Result<Ruleset> {
    match format {
        RulesetFormat::Json => parse_json(content),
        RulesetFormat::Yaml => parse_yaml(content),
        RulesetFormat::Toml => parse_toml(content),
    }
}

/// Detect the ruleset format from a file path based on its extension.
///
/// # Supported Extensions
///
/// * `.json` → `RulesetFormat::Json`
/// * `.yaml`, `.yml` → `RulesetFormat::Yaml`
/// * `.toml` → `RulesetFormat::Toml`
///
/// # Errors
///
/// Returns `ParserError::InvalidExtension` if the file has no extension.
/// Returns `ParserError::UnsupportedFormat` if the extension is not recognized.
pub fn detect_format(path: &Path) -> Result<RulesetFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(ParserError::InvalidExtension)?;

    match extension.to_lowercase().as_str() {
        "json" => Ok(RulesetFormat::Json),
        "yaml" | "yml" => Ok(RulesetFormat::Yaml),
        "toml" => Ok(RulesetFormat::Toml),
        other => Err(ParserError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a ruleset from a file with automatic format detection.
///
/// # Example
///
/// ```no_run
/// use conform_parser::parse_file;
/// use std::path::Path;
///
/// let ruleset = parse_file(Path::new("rulesets/user.yml")).unwrap();
/// println!("Loaded {} named rules", ruleset.rules.len());
/// ```
pub fn parse_file(path: &Path) -> Result<Ruleset> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, "loading ruleset");
    parse_str(&content, format)
}

fn compile(value: &Value) -> Result<Ruleset> {
    Ok(Ruleset::from_value(value)?)
}

fn toml_to_json(value: toml::Value) -> Result<Value> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ParserError::TomlError(format!("non-finite float {f}")))?,
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(toml_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, entry)| Ok((key, toml_to_json(entry)?)))
                .collect::<Result<Map<_, _>>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::TypeNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_json_minimal() {
        let ruleset = parse_json(r#"{"type": "string"}"#).expect("Failed to parse valid JSON");
        assert_eq!(ruleset.type_node, Some(TypeNode::rule("string")));
        assert!(ruleset.rules.is_empty());
    }

    #[test]
    fn test_parse_yaml_with_named_rules() {
        let yaml = r#"
type: integer
required: true
min: 0
max: 24
"#;

        let ruleset = parse_yaml(yaml).expect("Failed to parse YAML with rules");

        let names: Vec<_> = ruleset.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["required", "min", "max"]);
        assert_eq!(ruleset.rules[2].args, json!(24));
    }

    #[test]
    fn test_parse_yaml_nested_type() {
        let yaml = r#"
type:
  name:
    $validate: string
    $message: name please
  friends: [string]
  email:
    $pattern: "^[^@]+@[^@]+$"
  meta: {}
"#;

        let ruleset = parse_yaml(yaml).expect("Failed to parse nested YAML");
        let TypeNode::Object(fields) = ruleset.type_node.unwrap() else {
            panic!("expected an object node");
        };

        let keys: Vec<_> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "friends", "email", "meta"]);
        assert_eq!(
            fields[0].1,
            TypeNode::annotated(TypeNode::rule("string"), "name please")
        );
        assert_eq!(fields[1].1, TypeNode::plural(TypeNode::rule("string")));
        assert!(matches!(fields[2].1, TypeNode::Pattern(_)));
        assert_eq!(fields[3].1, TypeNode::AnyObject);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_yaml("type: [string\nrequired: true");
        assert!(matches!(result.unwrap_err(), ParserError::YamlError(_)));
    }

    #[test]
    fn test_parse_yaml_bad_ruleset() {
        let result = parse_yaml("type: [string, number]");
        assert!(matches!(
            result.unwrap_err(),
            ParserError::SchemaError(SchemaError::PluralArity(2))
        ));
    }

    #[test]
    fn test_parse_yaml_not_a_mapping() {
        let result = parse_yaml("- string");
        assert!(matches!(
            result.unwrap_err(),
            ParserError::SchemaError(SchemaError::InvalidRuleset(_))
        ));
    }

    #[test]
    fn test_parse_toml_with_type_table() {
        let toml = r#"
required = true
maxLength = 3

[type]
name = "string"
friends = ["string"]

[type.address]
city = "string"
"#;

        let ruleset = parse_toml(toml).expect("Failed to parse valid TOML");

        let names: Vec<_> = ruleset.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["required", "maxLength"]);

        let TypeNode::Object(fields) = ruleset.type_node.unwrap() else {
            panic!("expected an object node");
        };
        let keys: Vec<_> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "friends", "address"]);
    }

    #[test]
    fn test_parse_toml_datetime_as_string() {
        let ruleset = parse_toml("before = 2030-01-01T00:00:00Z").unwrap();
        assert_eq!(ruleset.rules[0].args, json!("2030-01-01T00:00:00Z"));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = parse_toml("type = ");
        assert!(matches!(result.unwrap_err(), ParserError::TomlError(_)));
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_json("{\"type\": ");
        assert!(matches!(result.unwrap_err(), ParserError::JsonError(_)));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("r.json")).unwrap(), RulesetFormat::Json);
        assert_eq!(detect_format(Path::new("r.yml")).unwrap(), RulesetFormat::Yaml);
        assert_eq!(detect_format(Path::new("r.YAML")).unwrap(), RulesetFormat::Yaml);
        assert_eq!(detect_format(Path::new("r.toml")).unwrap(), RulesetFormat::Toml);
    }

    #[test]
    fn test_detect_format_unsupported() {
        let result = detect_format(Path::new("ruleset.xml"));
        assert!(matches!(
            result.unwrap_err(),
            ParserError::UnsupportedFormat(ref ext) if ext == "xml"
        ));
    }

    #[test]
    fn test_detect_format_no_extension() {
        let result = detect_format(Path::new("ruleset"));
        assert!(matches!(result.unwrap_err(), ParserError::InvalidExtension));
    }
}
