use super::Lazy;
use crate::{Entity, Result, Store, Value};

use std::fmt;

/// Relationship cell for a one-to-one where the foreign key lives on the
/// related table. At most one row resolves; extra matches are ignored.
#[derive(Clone)]
pub struct HasOne<T> {
    cell: Lazy<Option<Box<T>>>,
}

impl<T: Entity> HasOne<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_loaded()
    }

    /// The cached value, if a resolution already ran.
    pub fn cached(&self) -> Option<Option<&T>> {
        match &self.cell {
            Lazy::NotLoaded => None,
            Lazy::Loaded(value) => Some(value.as_deref()),
        }
    }

    /// Resolves the related row whose `foreign_key` column equals this
    /// side's key, caching the result.
    pub fn get_or_load(
        &mut self,
        db: &Store,
        foreign_key: &str,
        local_value: impl Into<Value>,
    ) -> Result<Option<&T>> {
        if !self.cell.is_loaded() {
            let found: Option<T> = db.find_by(foreign_key, "=", local_value.into())?;
            self.cell = Lazy::Loaded(found.map(Box::new));
        }
        Ok(match &self.cell {
            Lazy::Loaded(value) => value.as_deref(),
            Lazy::NotLoaded => None,
        })
    }

    /// Stores a value directly, marking the cell loaded.
    pub fn set(&mut self, value: Option<T>) {
        self.cell = Lazy::Loaded(value.map(Box::new));
    }

    /// Clears the cache; the next access resolves again.
    pub fn invalidate(&mut self) {
        self.cell = Lazy::NotLoaded;
    }
}

impl<T> Default for HasOne<T> {
    fn default() -> Self {
        Self {
            cell: Lazy::NotLoaded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for HasOne<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Lazy::NotLoaded => fmt.write_str("<not loaded>"),
            Lazy::Loaded(value) => value.fmt(fmt),
        }
    }
}
