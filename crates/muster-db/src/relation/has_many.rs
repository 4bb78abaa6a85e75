use super::Lazy;
use crate::{Cond, Connective, Entity, Result, Store, Value};

use std::fmt;

/// Relationship cell for a one-to-many: all rows of the related table whose
/// foreign key points back at `self`. Loads once, caches the whole list.
#[derive(Clone)]
pub struct HasMany<T> {
    cell: Lazy<Vec<T>>,
}

impl<T: Entity> HasMany<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_loaded()
    }

    /// The cached list, if a resolution already ran.
    pub fn cached(&self) -> Option<&[T]> {
        match &self.cell {
            Lazy::NotLoaded => None,
            Lazy::Loaded(rows) => Some(rows),
        }
    }

    /// Resolves every related row whose `foreign_key` column equals this
    /// side's key, caching the list (an empty one included).
    pub fn get_or_load(
        &mut self,
        db: &Store,
        foreign_key: &str,
        local_value: impl Into<Value>,
    ) -> Result<&[T]> {
        if !self.cell.is_loaded() {
            let rows =
                db.select(&[(foreign_key, Cond::Eq(local_value.into()))], Connective::And)?;
            self.cell = Lazy::Loaded(rows);
        }
        Ok(match &self.cell {
            Lazy::Loaded(rows) => rows,
            Lazy::NotLoaded => &[],
        })
    }

    /// Stores a list directly, marking the cell loaded.
    pub fn set(&mut self, rows: Vec<T>) {
        self.cell = Lazy::Loaded(rows);
    }

    /// Clears the cache; the next access resolves again.
    pub fn invalidate(&mut self) {
        self.cell = Lazy::NotLoaded;
    }
}

impl<T> Default for HasMany<T> {
    fn default() -> Self {
        Self {
            cell: Lazy::NotLoaded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for HasMany<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Lazy::NotLoaded => fmt.write_str("<not loaded>"),
            Lazy::Loaded(rows) => rows.fmt(fmt),
        }
    }
}
