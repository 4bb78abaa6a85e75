use crate::{Error, Result, Value, DATETIME_FORMAT, DATE_FORMAT};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

/// An ordered field map: one fetched row, or the fields going into an
/// insert/update. Column order is preserved as inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    /// Sets a field, builder style.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Record {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Removes null-valued fields, keeping the rest in order.
    pub fn drop_nulls(mut self) -> Record {
        self.fields.retain(|_, value| !value.is_null());
        self
    }

    fn require(&self, column: &str) -> Result<&Value> {
        self.get(column).ok_or_else(|| Error::missing_column(column))
    }

    pub fn i64(&self, column: &str) -> Result<i64> {
        self.require(column)?.to_i64()
    }

    pub fn bool(&self, column: &str) -> Result<bool> {
        self.require(column)?.to_bool()
    }

    pub fn text(&self, column: &str) -> Result<String> {
        Ok(self.require(column)?.to_text()?.to_owned())
    }

    /// Parses a date column stored as `%Y-%m-%d`.
    pub fn date(&self, column: &str) -> Result<NaiveDate> {
        let text = self.require(column)?.to_text()?;
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|_| Error::type_conversion(text, "date"))
    }

    /// Parses a timestamp column, accepting a bare date as midnight.
    pub fn date_time(&self, column: &str) -> Result<NaiveDateTime> {
        let text = self.require(column)?.to_text()?;
        if let Ok(stamp) = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT) {
            return Ok(stamp);
        }
        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| Error::type_conversion(text, "datetime"))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Record {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}
