use std::fmt;

/// An error that can occur in the data layer.
///
/// Statement failures bubble up from the driver untranslated; the remaining
/// kinds cover hydration (a row missing a declared column, a value of the
/// wrong shape) and lookups that required a row to exist.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A statement failed inside the SQLite driver.
    #[error("driver operation failed: {0}")]
    Driver(#[from] rusqlite::Error),

    /// A fetched row did not contain a column the entity declares.
    #[error("missing column `{0}` in row")]
    MissingColumn(String),

    /// A value could not be converted to the requested type.
    #[error("cannot convert {value} to {target}")]
    TypeConversion { value: String, target: &'static str },

    /// A record that was required to exist could not be found.
    #[error("record not found: {0}")]
    RecordNotFound(String),
}

impl Error {
    pub fn missing_column(column: impl Into<String>) -> Error {
        Error::MissingColumn(column.into())
    }

    pub fn type_conversion(value: impl fmt::Debug, target: &'static str) -> Error {
        Error::TypeConversion {
            value: format!("{value:?}"),
            target,
        }
    }

    pub fn record_not_found(what: impl Into<String>) -> Error {
        Error::RecordNotFound(what.into())
    }
}
