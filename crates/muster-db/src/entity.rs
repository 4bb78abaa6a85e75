use crate::{Record, Result, Value};

/// Static description of the table backing an entity type.
///
/// `joins` are raw join fragments appended to every read of the table
/// (for example `"INNER JOIN locations ON events.location_id = locations.id"`).
/// None of the concrete entities currently declare any.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub joins: &'static [&'static str],
}

impl Table {
    /// `FROM`-clause text: the table name followed by its static joins.
    pub(crate) fn from_clause(&self) -> String {
        if self.joins.is_empty() {
            self.name.to_string()
        } else {
            format!("{} {}", self.name, self.joins.join(" "))
        }
    }
}

/// One row of one table, as a typed in-memory object.
///
/// Each concrete type supplies its table descriptor, a row constructor, and
/// a serializer back to a field map. Hydration only ever runs on
/// fully-populated rows; `from_row` may assume every declared column is
/// present.
pub trait Entity: Sized {
    fn table() -> &'static Table;

    /// Hydrates one instance from a fetched row.
    fn from_row(row: &Record) -> Result<Self>;

    /// The store-assigned identifier, if this instance has one.
    fn id(&self) -> Option<i64>;

    /// The entity's own declared columns as a field map. Relationship caches
    /// are not included.
    fn to_record(&self) -> Record;
}

/// Maps raw rows to entities. Order-preserving, one row to one instance.
pub fn hydrate<T: Entity>(rows: &[Record]) -> Result<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// One entry of a condition map: equality for plain values, or an explicit
/// `(operator, value)` pair.
#[derive(Debug, Clone)]
pub enum Cond {
    Eq(Value),
    Cmp(&'static str, Value),
}

impl Cond {
    pub fn eq(value: impl Into<Value>) -> Cond {
        Cond::Eq(value.into())
    }

    pub fn cmp(op: &'static str, value: impl Into<Value>) -> Cond {
        Cond::Cmp(op, value.into())
    }

    pub(crate) fn parts(&self) -> (&str, &Value) {
        match self {
            Cond::Eq(value) => ("=", value),
            Cond::Cmp(op, value) => (op, value),
        }
    }
}
