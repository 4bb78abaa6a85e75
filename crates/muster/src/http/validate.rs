use std::net::IpAddr;
use std::sync::OnceLock;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use muster_db::{Entity, Filter, Store, WhereClause, DATE_FORMAT};
use regex::Regex;
use serde_json::{Map, Value};

use super::error::ApiError;

/// Rule-chaining request validator.
///
/// Rules accumulate per-field error messages instead of failing fast, so a
/// response can report every problem at once. Apart from `required`, rules
/// skip fields that are absent from the request. Store-backed rules remember
/// the first database failure and surface it from [`Validator::finish`].
pub struct Validator<'a> {
    db: &'a Store,
    fields: &'a Map<String, Value>,
    errors: Map<String, Value>,
    failure: Option<muster_db::Error>,
}

impl<'a> Validator<'a> {
    pub fn new(db: &'a Store, fields: &'a Map<String, Value>) -> Validator<'a> {
        Validator {
            db,
            fields,
            errors: Map::new(),
            failure: None,
        }
    }

    /// The field must be present, non-null, and not the empty string.
    pub fn required(mut self, field: &str) -> Self {
        let present = match self.value(field) {
            None => false,
            Some(Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        };
        if !present {
            self.fail(field, format!("{field} is required."));
        }
        self
    }

    pub fn string(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => value.is_string(),
        };
        if !ok {
            self.fail(field, format!("{field} must be a valid string."));
        }
        self
    }

    pub fn email(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => value.as_str().is_some_and(|text| email_pattern().is_match(text)),
        };
        if !ok {
            self.fail(field, format!("{field} must be a valid email."));
        }
        self
    }

    pub fn ip(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => value
                .as_str()
                .is_some_and(|text| text.parse::<IpAddr>().is_ok()),
        };
        if !ok {
            self.fail(field, format!("{field} must be a valid IP address."));
        }
        self
    }

    pub fn boolean(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => as_boolean(value).is_some(),
        };
        if !ok {
            self.fail(field, format!("{field} must be a valid boolean."));
        }
        self
    }

    pub fn integer(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => int_value(value).is_some(),
        };
        if !ok {
            self.fail(field, format!("{field} must be a valid integer."));
        }
        self
    }

    pub fn numeric(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(Value::Number(_)) => true,
            Some(Value::String(text)) => text.parse::<f64>().is_ok(),
            Some(_) => false,
        };
        if !ok {
            self.fail(field, format!("{field} must be a valid numeric."));
        }
        self
    }

    /// String length bounds, inclusive on both ends.
    pub fn between(mut self, field: &str, min: usize, max: usize) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => value
                .as_str()
                .is_some_and(|text| (min..=max).contains(&text.chars().count())),
        };
        if !ok {
            self.fail(
                field,
                format!("{field} must be between {min} and {max} characters."),
            );
        }
        self
    }

    pub fn matches(mut self, field: &str, pattern: &Regex) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => value.as_str().is_some_and(|text| pattern.is_match(text)),
        };
        if !ok {
            self.fail(field, format!("{field} is not valid."));
        }
        self
    }

    /// The field must parse as a date and survive a round trip through the
    /// format, so `2024-2-1` is rejected even though it parses.
    pub fn date(mut self, field: &str) -> Self {
        let ok = match self.value(field) {
            None => true,
            Some(value) => value.as_str().is_some_and(|text| {
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map(|date| date.format(DATE_FORMAT).to_string() == text)
                    .unwrap_or(false)
            }),
        };
        if !ok {
            self.fail(
                field,
                format!("{field} must be a valid date in the format {DATE_FORMAT}."),
            );
        }
        self
    }

    /// The field must reference an existing `T` row by id.
    pub fn exists<T: Entity>(mut self, field: &str) -> Self {
        let id = match self.value(field) {
            None => return self,
            Some(value) => int_value(value),
        };
        let found = match id {
            Some(id) => self
                .probe(|db| db.find::<T>(id))
                .map(|row| row.is_some())
                .unwrap_or(false),
            None => false,
        };
        if !found {
            self.fail(field, format!("{field} is not valid."));
        }
        self
    }

    /// No `T` row may already hold this value in `column`, optionally
    /// ignoring the row with id `except`.
    pub fn unique<T: Entity>(
        mut self,
        field: &str,
        column: &str,
        except: Option<i64>,
        message: Option<&str>,
    ) -> Self {
        let bound = match self.value(field) {
            None => return self,
            Some(value) => bind_value(value),
        };
        let mut filter = Filter::new().and_where(column, "=", bound);
        if let Some(id) = except {
            filter = filter.and_where("id", "!=", id);
        }
        let clause = filter.build();
        let taken = self
            .probe(|db| db.count::<T>(&clause))
            .map(|count| count > 0)
            .unwrap_or(false);
        if taken {
            let message = message
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{field} already exists."));
            self.fail(field, message);
        }
        self
    }

    /// Uniqueness over a combination of fields. Skipped entirely when any of
    /// the fields is absent; the error is keyed under the joined field names.
    pub fn unique_on<T: Entity>(
        mut self,
        fields: &[&str],
        except: Option<i64>,
        message: &str,
    ) -> Self {
        let mut bound = Vec::with_capacity(fields.len());
        for field in fields {
            match self.value(field) {
                Some(value) => bound.push(bind_value(value)),
                None => return self,
            }
        }
        let mut filter = Filter::new();
        for (field, value) in fields.iter().zip(bound) {
            filter = filter.and_where(field, "=", value);
        }
        if let Some(id) = except {
            filter = filter.and_where("id", "!=", id);
        }
        let clause = filter.build();
        let taken = self
            .probe(|db| db.count::<T>(&clause))
            .map(|count| count > 0)
            .unwrap_or(false);
        if taken {
            let key = fields.join(", ");
            self.fail(&key, message.to_string());
        }
        self
    }

    /// Counts `T` rows matching `clause` and fails under `key` unless
    /// `admit` accepts the count.
    pub fn count<T: Entity>(
        mut self,
        key: &str,
        clause: &WhereClause,
        admit: impl FnOnce(u64) -> bool,
        message: &str,
    ) -> Self {
        let count = match self.probe(|db| db.count::<T>(clause)) {
            Some(count) => count,
            None => return self,
        };
        if !admit(count) {
            self.fail(key, message.to_string());
        }
        self
    }

    /// `Ok` when every rule passed. A database failure during a store-backed
    /// rule takes precedence over any field errors.
    pub fn finish(self) -> Result<(), ApiError> {
        if let Some(err) = self.failure {
            return Err(err.into());
        }
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }

    fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|value| !value.is_null())
    }

    fn fail(&mut self, field: &str, message: String) {
        let list = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = list {
            messages.push(Value::String(message));
        }
    }

    fn probe<R>(&mut self, check: impl FnOnce(&Store) -> muster_db::Result<R>) -> Option<R> {
        match check(self.db) {
            Ok(result) => Some(result),
            Err(err) => {
                self.failure.get_or_insert(err);
                None
            }
        }
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

/// Decodes a JSON request body into a field map. Anything that is not a JSON
/// object reads as an empty map: the rules then report fields as missing
/// instead of the transport rejecting the request.
pub fn body_fields(body: &[u8]) -> Map<String, Value> {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.as_object().cloned())
        .unwrap_or_default()
}

/// Collects query pairs into a field map; a repeated key keeps its last value.
pub fn query_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

/// Whether the field is present with a non-null value.
pub fn has(fields: &Map<String, Value>, field: &str) -> bool {
    matches!(fields.get(field), Some(value) if !value.is_null())
}

/// Loose boolean vocabulary: `true`/`false`, `0`/`1`, and the usual strings
/// (`"yes"`, `"off"`, ...). The empty string reads as `false`; anything else
/// unrecognized is `None`.
pub fn as_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Some(true),
            "false" | "0" | "off" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// An integer, or a string spelling one. Floats do not qualify.
pub fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn bind_value(value: &Value) -> muster_db::Value {
    match value {
        Value::Null => muster_db::Value::Null,
        Value::Bool(flag) => (*flag).into(),
        Value::Number(number) => match number.as_i64() {
            Some(int) => int.into(),
            None => number
                .as_f64()
                .map(Into::into)
                .unwrap_or(muster_db::Value::Null),
        },
        Value::String(text) => text.as_str().into(),
        other => muster_db::Value::Text(other.to_string()),
    }
}

/// Boolean accessor in the request-data sense: absent or unrecognized values
/// read as `false`.
pub fn bool_field(fields: &Map<String, Value>, field: &str) -> bool {
    fields.get(field).and_then(as_boolean).unwrap_or(false)
}

pub fn int_opt(fields: &Map<String, Value>, field: &str) -> Option<i64> {
    fields.get(field).and_then(int_value)
}

/// A validated date field that may be absent.
pub fn date_opt(fields: &Map<String, Value>, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    let Some(value) = fields.get(field).filter(|value| !value.is_null()) else {
        return Ok(None);
    };
    let text = value
        .as_str()
        .ok_or_else(|| anyhow!("field `{field}` is not a string"))?;
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .with_context(|| format!("field `{field}` is not a date"))?;
    Ok(Some(date))
}

// The accessors below run after validation has already vouched for the
// fields, so a miss is a programming error and maps to a 500.

pub fn str_field<'f>(fields: &'f Map<String, Value>, field: &str) -> Result<&'f str, ApiError> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Internal(anyhow!("field `{field}` is not a string")))
}

pub fn int_field(fields: &Map<String, Value>, field: &str) -> Result<i64, ApiError> {
    fields
        .get(field)
        .and_then(int_value)
        .ok_or_else(|| ApiError::Internal(anyhow!("field `{field}` is not an integer")))
}

pub fn date_field(fields: &Map<String, Value>, field: &str) -> Result<NaiveDate, ApiError> {
    date_opt(fields, field)?
        .ok_or_else(|| ApiError::Internal(anyhow!("field `{field}` is missing")))
}
