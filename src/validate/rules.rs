//! Built-in field rules and the checks that need no store access.

use regex::Regex;
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// A field value as seen by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// Absent from the payload
    Missing,
    Text(&'a str),
    Number(f64),
    Integer(i64),
    /// A collection, represented by its length
    List(usize),
    /// Unix seconds
    Timestamp(u64),
}

impl<'a> Value<'a> {
    pub fn text(value: Option<&'a str>) -> Self {
        value.map_or(Value::Missing, Value::Text)
    }

    pub fn number(value: Option<f64>) -> Self {
        value.map_or(Value::Missing, Value::Number)
    }

    pub fn integer(value: Option<i64>) -> Self {
        value.map_or(Value::Missing, Value::Integer)
    }

    pub fn list<T>(value: Option<&[T]>) -> Self {
        value.map_or(Value::Missing, |items| Value::List(items.len()))
    }

    pub fn timestamp(value: Option<u64>) -> Self {
        value.map_or(Value::Missing, Value::Timestamp)
    }

    /// Rendering used for the `actual_value` of a violation.
    pub fn render(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Text(s) => (*s).to_string(),
            Value::Number(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::List(len) => len.to_string(),
            Value::Timestamp(t) => t.to_string(),
        }
    }

    /// Magnitude compared by the bound rules: character count for text,
    /// element count for lists, the value itself for numbers.
    fn magnitude(&self) -> Option<f64> {
        match self {
            Value::Missing => None,
            Value::Text(s) => Some(s.chars().count() as f64),
            Value::Number(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            Value::List(len) => Some(*len as f64),
            Value::Timestamp(t) => Some(*t as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Present, and non-empty for text
    Required,
    /// Non-empty after trimming
    NotBlank,
    /// Email-shaped text
    Email,
    Min(f64),
    Max(f64),
    Gt(f64),
    Gte(f64),
    /// Strictly after the moment of evaluation
    Future,
    /// No row in `table` has this value in `column`
    Unique {
        table: &'static str,
        column: &'static str,
    },
    /// At least one row in `table` has this value in `column`
    Exists {
        table: &'static str,
        column: &'static str,
    },
}

impl Rule {
    /// Identifier reported as the `condition` of a violation.
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::NotBlank => "not_blank",
            Rule::Email => "email",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Gt(_) => "gt",
            Rule::Gte(_) => "gte",
            Rule::Future => "should_be_future",
            Rule::Unique { .. } => "should_be_unique",
            Rule::Exists { .. } => "should_exist",
        }
    }
}

/// Evaluate a rule that does not touch the store. Missing values only fail
/// `Required`; every other rule passes them through.
pub(super) fn check_local(rule: &Rule, value: &Value<'_>, now: u64) -> bool {
    if let Value::Missing = value {
        return !matches!(rule, Rule::Required);
    }

    match rule {
        Rule::Required => !matches!(value, Value::Text("")),
        Rule::NotBlank => match value {
            Value::Text(s) => !s.trim().is_empty(),
            Value::List(len) => *len > 0,
            _ => true,
        },
        Rule::Email => match value {
            Value::Text(s) => s.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(s),
            _ => false,
        },
        Rule::Min(bound) => value.magnitude().is_some_and(|m| m >= *bound),
        Rule::Max(bound) => value.magnitude().is_some_and(|m| m <= *bound),
        Rule::Gt(bound) => value.magnitude().is_some_and(|m| m > *bound),
        Rule::Gte(bound) => value.magnitude().is_some_and(|m| m >= *bound),
        Rule::Future => match value {
            Value::Timestamp(t) => *t > now,
            _ => false,
        },
        // Store-backed rules are resolved by the validator.
        Rule::Unique { .. } | Rule::Exists { .. } => true,
    }
}

/// Wall-clock time in Unix seconds; a clock before the epoch reads as zero.
pub(super) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
