use super::Lazy;
use crate::{Entity, Result, Store, Value};

use std::fmt;

/// Relationship cell for the owning side of an association: the foreign key
/// lives on `self`, the target row on the related table.
///
/// Resolution is read-only and caches on first use; a cached result (even
/// "no row") is authoritative until [`BelongsTo::invalidate`].
#[derive(Clone)]
pub struct BelongsTo<T> {
    cell: Lazy<Option<Box<T>>>,
}

impl<T: Entity> BelongsTo<T> {
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

    /// Resolves the row of the related table whose `owner_key` column equals
    /// this side's foreign-key value, caching the result.
    pub fn get_or_load(
        &mut self,
        db: &Store,
        owner_key: &str,
        foreign_value: impl Into<Value>,
    ) -> Result<Option<&T>> {
        if !self.cell.is_loaded() {
            let found: Option<T> = db.find_by(owner_key, "=", foreign_value.into())?;
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

impl<T> Default for BelongsTo<T> {
    fn default() -> Self {
        Self {
            cell: Lazy::NotLoaded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BelongsTo<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Lazy::NotLoaded => fmt.write_str("<not loaded>"),
            Lazy::Loaded(value) => value.fmt(fmt),
        }
    }
}
