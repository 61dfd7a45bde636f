//! Declarative request validation.
//!
//! Request types describe their fields as an ordered table of `Field`s, each
//! with its own rule list. A `Validator` walks the whole table and collects
//! every violation in one pass. Within a single field, evaluation stops at the
//! first failing rule, so a store lookup never runs on a value that is
//! already known to be bad.

mod rules;

use async_trait::async_trait;
use std::sync::Arc;

pub use rules::{Rule, Value};

use crate::db::Database;
use crate::error::{AppError, FieldViolation, ResultExt, ValidationErrors};

/// One row of a request's validation table.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    pub path: String,
    pub value: Value<'a>,
    pub rules: Vec<Rule>,
    /// Reported with an empty actual value
    pub secret: bool,
}

impl<'a> Field<'a> {
    pub fn new(path: impl Into<String>, value: Value<'a>) -> Self {
        Self {
            path: path.into(),
            value,
            rules: Vec::new(),
            secret: false,
        }
    }

    /// Keep the submitted value out of violation reports.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }
}

/// Implemented by every inbound request object.
pub trait Validate: Send + Sync {
    /// Prefix of every reported field path, e.g. `user_request`.
    const NAME: &'static str;

    /// Fields and their rules, in evaluation order.
    fn fields(&self) -> Vec<Field<'_>>;
}

/// Store access needed by the `Unique` and `Exists` rules.
#[async_trait]
pub trait RecordLookup: Send + Sync {
    async fn matching_rows(&self, table: &str, column: &str, value: &str)
    -> Result<i64, AppError>;
}

#[async_trait]
impl RecordLookup for Database {
    async fn matching_rows(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<i64, AppError> {
        self.count_matching(table, column, value)
            .await
            .internal("Failed to evaluate store rule")
    }
}

#[derive(Clone)]
pub struct Validator {
    lookup: Arc<dyn RecordLookup>,
}

impl Validator {
    pub fn new(lookup: Arc<dyn RecordLookup>) -> Self {
        Self { lookup }
    }

    /// Evaluate every field of `request`. Fails with the complete violation
    /// list, or with `Internal` if the store could not be consulted.
    pub async fn validate<R: Validate>(&self, request: &R) -> Result<(), AppError> {
        let now = rules::unix_now();
        let mut errors = ValidationErrors::new();

        for field in request.fields() {
            for rule in &field.rules {
                if !self.check(rule, &field.value, now).await? {
                    let actual = if field.secret {
                        String::new()
                    } else {
                        field.value.render()
                    };
                    errors.push(FieldViolation::new(
                        format!("{}.{}", R::NAME, field.path),
                        rule.tag(),
                        actual,
                    ));
                    break;
                }
            }
        }

        errors.into_result()
    }

    async fn check(&self, rule: &Rule, value: &Value<'_>, now: u64) -> Result<bool, AppError> {
        match (rule, value) {
            (_, Value::Missing) => Ok(rules::check_local(rule, value, now)),
            (Rule::Unique { table, column }, Value::Text(s)) => {
                Ok(self.lookup.matching_rows(table, column, s).await? == 0)
            }
            (Rule::Exists { table, column }, Value::Text(s)) => {
                Ok(self.lookup.matching_rows(table, column, s).await? > 0)
            }
            // Store rules only apply to text keys
            (Rule::Unique { .. } | Rule::Exists { .. }, _) => Ok(false),
            _ => Ok(rules::check_local(rule, value, now)),
        }
    }
}
