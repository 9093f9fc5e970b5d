//! Field validation for job blocks
//!
//! Every check records a [`JobError::Validation`] that names the job index and
//! the attribute, so one pass reports every problem in the configuration.

use super::JobError;
use tf_provider::Value;

/// When validation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `ValidateResourceConfig`: values may still be unknown
    Config,
    /// Create/update/delete: every value must be known
    Apply,
}

pub type StringList = Vec<Value<String>>;

/// Collects validation errors for one job block
pub struct Validator<'e> {
    index: usize,
    phase: Phase,
    errors: &'e mut Vec<JobError>,
}

impl<'e> Validator<'e> {
    pub fn new(index: usize, phase: Phase, errors: &'e mut Vec<JobError>) -> Self {
        Self {
            index,
            phase,
            errors,
        }
    }

    pub fn error(&mut self, field: &'static str, reason: impl Into<String>) {
        self.errors.push(JobError::Validation {
            index: self.index,
            field,
            reason: reason.into(),
        });
    }

    fn unknown(&mut self, field: &'static str) {
        if self.phase == Phase::Apply {
            self.error(field, "value is not known at apply time");
        }
    }

    /// Required, non-empty string
    pub fn required_str(&mut self, field: &'static str, value: &Value<String>) -> Option<String> {
        match value {
            Value::Value(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Value(_) => {
                self.error(field, "must not be empty");
                None
            }
            Value::Null => {
                self.error(field, "is required");
                None
            }
            Value::Unknown => {
                self.unknown(field);
                None
            }
        }
    }

    /// Optional string; empty strings are treated as unset
    pub fn optional_str(&mut self, field: &'static str, value: &Value<String>) -> Option<String> {
        match value {
            Value::Value(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Value(_) | Value::Null => None,
            Value::Unknown => {
                self.unknown(field);
                None
            }
        }
    }

    /// Required string that must equal `expected` exactly
    pub fn literal(
        &mut self,
        field: &'static str,
        value: &Value<String>,
        expected: &str,
    ) -> Option<String> {
        let actual = self.required_str(field, value)?;
        if actual != expected {
            self.error(field, format!("must be \"{expected}\", got \"{actual}\""));
            return None;
        }
        Some(actual)
    }

    /// Optional string restricted to `allowed`
    pub fn one_of(
        &mut self,
        field: &'static str,
        value: &Value<String>,
        allowed: &[&str],
    ) -> Option<String> {
        let actual = self.optional_str(field, value)?;
        if !allowed.contains(&actual.as_str()) {
            self.error(
                field,
                format!("must be one of [{}], got \"{actual}\"", allowed.join(", ")),
            );
            return None;
        }
        Some(actual)
    }

    /// Required string restricted to `allowed`
    pub fn required_one_of(
        &mut self,
        field: &'static str,
        value: &Value<String>,
        allowed: &[&str],
    ) -> Option<String> {
        if matches!(value, Value::Null) {
            self.error(field, "is required");
            return None;
        }
        if matches!(value, Value::Value(s) if s.trim().is_empty()) {
            self.error(field, "must not be empty");
            return None;
        }
        self.one_of(field, value, allowed)
    }

    /// Quartz cron expression: 6 or 7 whitespace separated fields
    pub fn cron(&mut self, field: &'static str, value: &Value<String>) -> Option<String> {
        let expr = self.required_str(field, value)?;
        let fields = expr.split_whitespace().count();
        if !(6..=7).contains(&fields) {
            self.error(
                field,
                format!("must be a Quartz cron expression with 6 or 7 fields, got {fields}"),
            );
            return None;
        }
        Some(expr)
    }

    /// Optional list of strings; every element must be a non-empty string
    pub fn optional_list(
        &mut self,
        field: &'static str,
        value: &Value<StringList>,
    ) -> Option<Vec<String>> {
        match value {
            Value::Value(items) => self.list_items(field, items),
            Value::Null => None,
            Value::Unknown => {
                self.unknown(field);
                None
            }
        }
    }

    /// Required, non-empty list of strings
    pub fn required_list(
        &mut self,
        field: &'static str,
        value: &Value<StringList>,
    ) -> Option<Vec<String>> {
        match value {
            Value::Value(items) if items.is_empty() => {
                self.error(field, "must contain at least one element");
                None
            }
            Value::Null => {
                self.error(field, "is required");
                None
            }
            _ => self.optional_list(field, value),
        }
    }

    fn list_items(&mut self, field: &'static str, items: &[Value<String>]) -> Option<Vec<String>> {
        let mut out = Vec::with_capacity(items.len());
        let mut complete = true;
        for item in items {
            match item {
                Value::Value(s) if !s.trim().is_empty() => out.push(s.clone()),
                Value::Unknown => {
                    self.unknown(field);
                    complete = false;
                }
                _ => {
                    self.error(field, "elements must be non-empty strings");
                    complete = false;
                }
            }
        }
        complete.then_some(out)
    }
}
