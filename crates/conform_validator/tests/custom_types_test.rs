//! Tests for declaring custom rules and using them as types.
//!
//! Registrations live on the validator that received them: they are visible
//! to every later call through it and to nothing else.

use conform_core::{Ruleset, SchemaError, ValidationContext, predicate};
use conform_validator::{RuleRegistry, Validator};
use serde_json::json;

fn ruleset(value: serde_json::Value) -> Ruleset {
    Ruleset::from_value(&value).expect("valid ruleset")
}

#[test]
fn test_single_definition() {
    let mut validator = Validator::new();
    validator
        .register_type("five", |datum, _, _| Ok(datum.as_f64() == Some(5.0)))
        .unwrap();

    let rules = ruleset(json!({"type": {"houseNumber": "five"}}));
    let context = ValidationContext::new();

    let outcome = validator
        .validate(&json!({"houseNumber": 5}), &rules, &context)
        .unwrap();
    assert!(outcome.is_ok());

    let error = validator
        .validate(&json!({"houseNumber": 4}), &rules, &context)
        .unwrap()
        .unwrap_err();
    assert_eq!(error.rule, "five");
    assert_eq!(error.property, "houseNumber");
}

#[test]
fn test_dictionary_of_definitions() {
    let mut validator = Validator::new();
    validator
        .register_types([
            ("five", predicate(|datum, _, _| Ok(datum.as_f64() == Some(5.0)))),
            (
                "yummyFish",
                predicate(|datum, _, _| Ok(datum.as_str() == Some("tuna"))),
            ),
        ])
        .unwrap();

    let rules = ruleset(json!({"type": {"houseNumber": "five", "fish": "yummyFish"}}));
    assert!(validator
        .is_valid(&json!({"houseNumber": 5, "fish": "tuna"}), &rules, &ValidationContext::new())
        .unwrap());
    assert!(!validator
        .is_valid(&json!({"houseNumber": 5, "fish": "cod"}), &rules, &ValidationContext::new())
        .unwrap());
}

#[test]
fn test_bad_dictionary_names_the_key() {
    let mut validator = Validator::new();
    let err = validator
        .register_types([
            ("five", predicate(|_, _, _| Ok(true))),
            ("", predicate(|_, _, _| Ok(true))),
        ])
        .unwrap_err();

    assert!(matches!(err, SchemaError::InvalidDefinition(ref name) if name.is_empty()));
    assert!(validator.registry().get("five").is_none());
}

#[test]
fn test_context_for_cross_field_rules() {
    let user = json!({"password": "passW0rd", "passwordConfirmation": "passW0rd"});

    let mut validator = Validator::new();
    validator
        .register_type("password", |datum, _, ctx| {
            Ok(datum.value() == ctx.get("passwordConfirmation").value())
        })
        .unwrap();

    let context = ValidationContext::from_value(user.clone()).unwrap();
    let rules = ruleset(json!({"type": "password"}));

    assert!(validator.is_valid(&user["password"], &rules, &context).unwrap());
    assert!(!validator.is_valid(&json!("other"), &rules, &context).unwrap());
}

#[test]
fn test_custom_rule_as_named_rule() {
    let mut validator = Validator::new();
    validator
        .register_type("divisibleBy", |datum, args, _| {
            let divisor = args.first().and_then(|a| a.as_i64()).unwrap_or(1);
            Ok(datum.value().and_then(|v| v.as_i64()).is_some_and(|n| n % divisor == 0))
        })
        .unwrap();

    let rules = ruleset(json!({"type": "integer", "divisibleBy": 3}));
    let context = ValidationContext::new().with_field_name("count");

    assert!(validator.is_valid(&json!(9), &rules, &context).unwrap());
    let error = validator
        .validate(&json!(10), &rules, &context)
        .unwrap()
        .unwrap_err();
    assert_eq!(
        error.message,
        "Invalid count. Input failed divisibleBy validation: 10"
    );
}

#[test]
fn test_registrations_do_not_leak_between_validators() {
    let mut first = Validator::new();
    first.register_type("five", |datum, _, _| Ok(datum.as_f64() == Some(5.0))).unwrap();
    let second = Validator::new();

    let rules = ruleset(json!({"type": "five"}));
    assert!(first.is_valid(&json!(5), &rules, &ValidationContext::new()).unwrap());

    let err = second
        .validate(&json!(5), &rules, &ValidationContext::new())
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnknownRule(ref name) if name == "five"));
}

#[test]
fn test_shared_registry_clone() {
    let mut registry = RuleRegistry::with_builtins();
    registry.register("five", |datum, _, _| Ok(datum.as_f64() == Some(5.0))).unwrap();

    let left = Validator::with_registry(registry.clone());
    let right = Validator::with_registry(registry);
    let rules = ruleset(json!({"type": ["five"]}));

    assert!(left.is_valid(&json!([5, 5]), &rules, &ValidationContext::new()).unwrap());
    assert!(!right.is_valid(&json!([5, 6]), &rules, &ValidationContext::new()).unwrap());
}

#[test]
fn test_overriding_a_builtin() {
    let mut validator = Validator::new();
    validator.register_type("string", |_, _, _| Ok(true)).unwrap();

    let rules = ruleset(json!({"type": "string"}));
    assert!(validator.is_valid(&json!(42), &rules, &ValidationContext::new()).unwrap());
}

#[test]
fn test_panicking_rule_does_not_crash_the_caller() {
    let mut validator = Validator::new();
    validator
        .register_type("firstCharUpper", |datum, _, _| {
            let text = datum.as_str().unwrap();
            Ok(text.chars().next().is_some_and(char::is_uppercase))
        })
        .unwrap();

    let rules = ruleset(json!({"type": "firstCharUpper"}));
    let context = ValidationContext::new().with_field_name("initial");

    assert!(validator.is_valid(&json!("Ada"), &rules, &context).unwrap());

    let error = validator
        .validate(&json!(5), &rules, &context)
        .unwrap()
        .unwrap_err();
    assert_eq!(error.rule, "firstCharUpper");
    assert_eq!(
        error.message,
        "`initial` should be a firstCharUpper (instead of 5, which is a number)"
    );

    let rules = ruleset(json!({"firstCharUpper": true}));
    let error = validator
        .validate(&json!(5), &rules, &context)
        .unwrap()
        .unwrap_err();
    assert_eq!(
        error.message,
        "Invalid initial. Input failed firstCharUpper validation: 5"
    );
}
