mod entity;
pub use entity::{hydrate, Cond, Entity, Table};

mod error;
pub use error::Error;

pub mod filter;
pub use filter::{Connective, Filter, WhereClause};

mod record;
pub use record::Record;

pub mod relation;
pub use relation::{BelongsTo, BelongsToMany, HasMany, HasOne, Pivot};

mod store;
pub use store::{Session, Store};

mod value;
pub use value::{Value, DATETIME_FORMAT, DATE_FORMAT};

/// A Result type alias that uses this crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
