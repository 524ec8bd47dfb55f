//! Built-in rules.
//!
//! Every rule has the predicate shape `(datum, args, context) -> RuleResult`.
//! Type names (`string`, `integer`, ...) are used as `type` leaves and take no
//! arguments. Constraint rules (`max`, `url`, `before`, ...) receive their
//! declared value as `args[0]` and return a [`RuleError`] when that argument
//! is unusable, which the engine reports as a failed check.

use crate::RuleRegistry;
use chrono::{DateTime, NaiveDate, Utc};
use conform_core::{Datum, RuleError, RuleResult, ValidationContext};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use url::Url;
use validator::ValidateEmail;

type BuiltinRule = fn(Datum<'_>, &[Value], &ValidationContext) -> RuleResult;

const BUILTINS: &[(&str, BuiltinRule)] = &[
    ("required", required),
    ("empty", empty),
    ("notEmpty", not_empty),
    ("undefined", undefined),
    ("null", is_null),
    ("notNull", not_null),
    ("string", string),
    ("text", string),
    ("alpha", alpha),
    ("alphanumeric", alphanumeric),
    ("number", number),
    ("numeric", numeric),
    ("integer", integer),
    ("int", integer),
    ("decimal", numeric),
    ("float", numeric),
    ("boolean", boolean),
    ("array", array),
    ("object", object),
    ("json", is_json),
    ("email", email),
    ("url", is_url),
    ("urlish", is_urlish),
    ("date", date),
    ("datetime", datetime),
    ("before", before),
    ("after", after),
    ("max", max),
    ("min", min),
    ("greaterThan", greater_than),
    ("lessThan", less_than),
    ("maxLength", max_length),
    ("minLength", min_length),
    ("len", len),
    ("in", is_in),
    ("notIn", not_in),
    ("contains", contains),
    ("notContains", not_contains),
    ("regex", matches_regex),
    ("equals", equals),
    ("uuid", is_uuid),
    ("hexadecimal", hexadecimal),
    ("hexColor", hex_color),
    ("lowercase", lowercase),
    ("uppercase", uppercase),
    ("truthy", truthy),
    ("falsey", falsey),
];

static URLISH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^/\s]+\.)+\S+\s*$").expect("urlish pattern is a valid regex")
});

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is a valid regex")
});

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("hex color pattern is a valid regex")
});

/// Patterns compiled by the `regex` rule, keyed by source.
static REGEX_CACHE: LazyLock<Mutex<HashMap<String, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Cache entries kept before the cache is cleared.
const REGEX_CACHE_CAPACITY: usize = 256;

/// Adds every built-in rule to `registry`.
pub fn install(registry: &mut RuleRegistry) {
    for (name, rule) in BUILTINS {
        registry.insert(*name, Arc::new(*rule));
    }
}

/// Returns the names of all built-in rules.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

// ============================================================================
// Argument helpers
// ============================================================================

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn number_arg(args: &[Value], rule: &str) -> Result<f64, RuleError> {
    args.first()
        .and_then(to_number)
        .ok_or_else(|| RuleError::new(format!("`{rule}` expects a numeric argument")))
}

fn length_arg(args: &[Value], rule: &str) -> Result<usize, RuleError> {
    args.first()
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| RuleError::new(format!("`{rule}` expects a non-negative integer")))
}

fn str_arg<'a>(args: &'a [Value], rule: &str) -> Result<&'a str, RuleError> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| RuleError::new(format!("`{rule}` expects a string argument")))
}

fn array_arg<'a>(args: &'a [Value], rule: &str) -> Result<&'a Vec<Value>, RuleError> {
    args.first()
        .and_then(Value::as_array)
        .ok_or_else(|| RuleError::new(format!("`{rule}` expects an array argument")))
}

/// Returns the compiled `pattern`, compiling it on first use.
fn cached_regex(pattern: &str) -> Result<Regex, RuleError> {
    let mut cache = REGEX_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).map_err(|e| RuleError::new(e.to_string()))?;
    if cache.len() >= REGEX_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn length_of(datum: Datum<'_>) -> Option<usize> {
    match datum.value()? {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Parses an RFC 3339 datetime, a `YYYY-MM-DD` date or epoch milliseconds.
fn to_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn date_arg(args: &[Value], rule: &str) -> Result<DateTime<Utc>, RuleError> {
    args.first()
        .and_then(to_instant)
        .ok_or_else(|| RuleError::new(format!("`{rule}` expects a date argument")))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_truthy(datum: Datum<'_>) -> bool {
    match datum.value() {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

// ============================================================================
// Presence
// ============================================================================

/// Fails for missing, `null`, `""`, `false` and `[]`. `0` is allowed.
/// `required: false` always passes.
fn required(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    if matches!(args.first(), Some(Value::Bool(false))) {
        return Ok(true);
    }
    Ok(match datum.value() {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    })
}

fn empty(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.value().is_some_and(is_blank))
}

fn not_empty(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum
        .value()
        .is_some_and(|value| !value.is_null() && !is_blank(value)))
}

fn undefined(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.is_missing())
}

fn is_null(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.is_null())
}

fn not_null(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(!datum.is_missing() && !datum.is_null())
}

fn truthy(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(is_truthy(datum))
}

fn falsey(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(!is_truthy(datum))
}

// ============================================================================
// Types
// ============================================================================

fn string(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some())
}

fn alpha(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum
        .as_str()
        .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_alphabetic)))
}

fn alphanumeric(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum
        .as_str()
        .is_some_and(|s| !s.is_empty() && s.chars().all(char::is_alphanumeric)))
}

fn number(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(matches!(datum.value(), Some(Value::Number(_))))
}

/// Numbers and numeric strings.
fn numeric(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.value().and_then(to_number).is_some())
}

fn integer(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(match datum.value() {
        Some(Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        Some(Value::String(s)) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    })
}

fn boolean(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_bool().is_some())
}

fn array(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_array().is_some())
}

fn object(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_object().is_some())
}

fn is_json(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum
        .as_str()
        .is_some_and(|s| serde_json::from_str::<Value>(s).is_ok()))
}

// ============================================================================
// Text formats
// ============================================================================

fn email(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some_and(|s| s.validate_email()))
}

/// Options accepted by the `url` rule, e.g. `url: { require_protocol: true }`.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct UrlOptions {
    require_protocol: bool,
    require_tld: bool,
    protocols: Vec<String>,
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            require_protocol: false,
            require_tld: true,
            protocols: vec!["http".to_string(), "https".to_string(), "ftp".to_string()],
        }
    }
}

impl UrlOptions {
    fn from_args(args: &[Value]) -> Result<Self, RuleError> {
        match args.first() {
            None | Some(Value::Null) | Some(Value::Bool(_)) => Ok(Self::default()),
            Some(options @ Value::Object(_)) => serde_json::from_value(options.clone())
                .map_err(|e| RuleError::new(format!("invalid `url` options: {e}"))),
            Some(other) => Err(RuleError::new(format!(
                "`url` expects `true` or an options object, found {other}"
            ))),
        }
    }
}

fn is_url(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let options = UrlOptions::from_args(args)?;
    let Some(text) = datum.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(false);
    };

    let candidate: Cow<'_, str> = if text.contains("://") {
        Cow::Borrowed(text)
    } else if options.require_protocol {
        return Ok(false);
    } else {
        Cow::Owned(format!("http://{text}"))
    };

    let Ok(parsed) = Url::parse(&candidate) else {
        return Ok(false);
    };
    if !options
        .protocols
        .iter()
        .any(|p| p.eq_ignore_ascii_case(parsed.scheme()))
    {
        return Ok(false);
    }

    Ok(parsed
        .host_str()
        .is_some_and(|host| !options.require_tld || host.contains('.')))
}

fn is_urlish(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some_and(|s| URLISH.is_match(s)))
}

fn is_uuid(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some_and(|s| UUID.is_match(s)))
}

fn hexadecimal(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum
        .as_str()
        .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())))
}

fn hex_color(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some_and(|s| HEX_COLOR.is_match(s)))
}

fn lowercase(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some_and(|s| s == s.to_lowercase()))
}

fn uppercase(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.as_str().is_some_and(|s| s == s.to_uppercase()))
}

fn matches_regex(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let pattern = str_arg(args, "regex")?;
    let regex = cached_regex(pattern)?;
    Ok(datum.as_str().is_some_and(|s| regex.is_match(s)))
}

// ============================================================================
// Dates
// ============================================================================

fn date(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(matches!(datum.value(), Some(v @ Value::String(_)) if to_instant(v).is_some()))
}

fn datetime(datum: Datum<'_>, _args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum
        .as_str()
        .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()))
}

fn before(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = date_arg(args, "before")?;
    Ok(datum.value().and_then(to_instant).is_some_and(|d| d < limit))
}

fn after(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = date_arg(args, "after")?;
    Ok(datum.value().and_then(to_instant).is_some_and(|d| d > limit))
}

// ============================================================================
// Comparisons
// ============================================================================

fn max(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = number_arg(args, "max")?;
    Ok(datum.value().and_then(to_number).is_some_and(|n| n <= limit))
}

fn min(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = number_arg(args, "min")?;
    Ok(datum.value().and_then(to_number).is_some_and(|n| n >= limit))
}

fn greater_than(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = number_arg(args, "greaterThan")?;
    Ok(datum.value().and_then(to_number).is_some_and(|n| n > limit))
}

fn less_than(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = number_arg(args, "lessThan")?;
    Ok(datum.value().and_then(to_number).is_some_and(|n| n < limit))
}

fn max_length(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = length_arg(args, "maxLength")?;
    Ok(length_of(datum).is_some_and(|n| n <= limit))
}

fn min_length(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let limit = length_arg(args, "minLength")?;
    Ok(length_of(datum).is_some_and(|n| n >= limit))
}

/// `len: 3` is a minimum; `len: [2, 5]` is an inclusive range.
fn len(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let (low, high) = match args.first() {
        Some(Value::Array(bounds)) => match bounds.as_slice() {
            [low, high] => (
                length_arg(std::slice::from_ref(low), "len")?,
                Some(length_arg(std::slice::from_ref(high), "len")?),
            ),
            _ => return Err(RuleError::new("`len` expects [min, max]")),
        },
        _ => (length_arg(args, "len")?, None),
    };
    Ok(length_of(datum).is_some_and(|n| n >= low && high.is_none_or(|high| n <= high)))
}

fn is_in(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let allowed = array_arg(args, "in")?;
    Ok(datum.value().is_some_and(|value| allowed.contains(value)))
}

fn not_in(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let denied = array_arg(args, "notIn")?;
    Ok(datum.value().is_none_or(|value| !denied.contains(value)))
}

fn contains(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    let needle = args
        .first()
        .ok_or_else(|| RuleError::new("`contains` expects an argument"))?;
    Ok(match (datum.value(), needle) {
        (Some(Value::String(s)), Value::String(sub)) => s.contains(sub.as_str()),
        (Some(Value::Array(items)), needle) => items.contains(needle),
        _ => false,
    })
}

fn not_contains(datum: Datum<'_>, args: &[Value], ctx: &ValidationContext) -> RuleResult {
    if length_of(datum).is_none() {
        return Ok(false);
    }
    contains(datum, args, ctx).map(|found| !found)
}

fn equals(datum: Datum<'_>, args: &[Value], _ctx: &ValidationContext) -> RuleResult {
    Ok(datum.value() == args.first())
}
