use crate::Value;

use chrono::NaiveDate;

/// Boolean connective between two predicate fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// Accumulates WHERE-clause fragments and their bound values for a single
/// query, without executing anything.
///
/// Fragments and values stay 1:1 by position: every `?` appended adds exactly
/// one value to the bound list. Field and operator strings are trusted
/// code-supplied literals; only values are parameterized.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fragments: Vec<String>,
    values: Vec<Value>,
}

impl Filter {
    pub fn new() -> Filter {
        Filter::default()
    }

    /// Appends `field op ?`, joined to the previous fragment with `AND`.
    pub fn and_where(self, field: &str, op: &str, value: impl Into<Value>) -> Filter {
        self.push(field, op, value.into(), Connective::And)
    }

    /// Appends `field op ?`, joined to the previous fragment with `OR`.
    pub fn or_where(self, field: &str, op: &str, value: impl Into<Value>) -> Filter {
        self.push(field, op, value.into(), Connective::Or)
    }

    /// Appends `field IN (?, ...)` with one placeholder per value. A no-op
    /// when `values` is empty.
    pub fn where_in(mut self, field: &str, values: Vec<Value>, connective: Connective) -> Filter {
        if values.is_empty() {
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push_fragment(format!("{field} IN ({placeholders})"), connective);
        self.values.extend(values);
        self
    }

    /// Substring match: `field LIKE '%keyword%'`.
    pub fn where_string_has(self, field: &str, keyword: &str, connective: Connective) -> Filter {
        self.like(field, format!("%{keyword}%"), connective)
    }

    /// Prefix match: `field LIKE 'keyword%'`.
    pub fn where_string_starts_with(
        self,
        field: &str,
        keyword: &str,
        connective: Connective,
    ) -> Filter {
        self.like(field, format!("{keyword}%"), connective)
    }

    /// Suffix match: `field LIKE '%keyword'`.
    pub fn where_string_ends_with(
        self,
        field: &str,
        keyword: &str,
        connective: Connective,
    ) -> Filter {
        self.like(field, format!("%{keyword}"), connective)
    }

    /// Exact match through LIKE, the way the lookup endpoints do it.
    pub fn where_string(self, field: &str, keyword: &str, connective: Connective) -> Filter {
        self.like(field, keyword.to_owned(), connective)
    }

    /// Date equality, the date rendered `%Y-%m-%d`.
    pub fn where_date(self, field: &str, date: NaiveDate, connective: Connective) -> Filter {
        self.push(field, "=", date.into(), connective)
    }

    /// Strictly-before comparison on a `%Y-%m-%d` date.
    pub fn where_before_date(self, field: &str, date: NaiveDate, connective: Connective) -> Filter {
        self.push(field, "<", date.into(), connective)
    }

    /// Strictly-after comparison on a `%Y-%m-%d` date.
    pub fn where_after_date(self, field: &str, date: NaiveDate, connective: Connective) -> Filter {
        self.push(field, ">", date.into(), connective)
    }

    /// Appends `field IS NULL`. No placeholder, no bound value.
    pub fn where_null(mut self, field: &str, connective: Connective) -> Filter {
        self.push_fragment(format!("{field} IS NULL"), connective);
        self
    }

    /// Appends `field IS NOT NULL`. No placeholder, no bound value.
    pub fn where_not_null(mut self, field: &str, connective: Connective) -> Filter {
        self.push_fragment(format!("{field} IS NOT NULL"), connective);
        self
    }

    /// Runs `apply` only when `condition` holds. The unchosen branch is
    /// never evaluated.
    pub fn when(self, condition: bool, apply: impl FnOnce(Filter) -> Filter) -> Filter {
        if condition {
            apply(self)
        } else {
            self
        }
    }

    /// Like [`Filter::when`], with an alternative branch.
    pub fn when_or_else(
        self,
        condition: bool,
        apply: impl FnOnce(Filter) -> Filter,
        otherwise: impl FnOnce(Filter) -> Filter,
    ) -> Filter {
        if condition {
            apply(self)
        } else {
            otherwise(self)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Composes the final clause. The predicate string and the bound values
    /// are one unit; callers always hand both to execution together.
    pub fn build(self) -> WhereClause {
        let sql = if self.fragments.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.fragments.join(" "))
        };
        WhereClause {
            sql,
            values: self.values,
        }
    }

    fn push(mut self, field: &str, op: &str, value: Value, connective: Connective) -> Filter {
        self.push_fragment(format!("{field} {op} ?"), connective);
        self.values.push(value);
        self
    }

    fn like(self, field: &str, pattern: String, connective: Connective) -> Filter {
        self.push(field, "LIKE", Value::Text(pattern), connective)
    }

    // The connective is dropped for the first fragment.
    fn push_fragment(&mut self, fragment: String, connective: Connective) {
        if self.fragments.is_empty() {
            self.fragments.push(fragment);
        } else {
            self.fragments
                .push(format!("{} {}", connective.as_str(), fragment));
        }
    }
}

/// A composed predicate and its bound values, consumed together.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    sql: String,
    values: Vec<Value>,
}

impl WhereClause {
    /// A clause matching everything.
    pub fn empty() -> WhereClause {
        WhereClause::default()
    }

    /// `"WHERE ..."`, or an empty string when nothing was accumulated.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

impl From<Filter> for WhereClause {
    fn from(filter: Filter) -> WhereClause {
        filter.build()
    }
}
