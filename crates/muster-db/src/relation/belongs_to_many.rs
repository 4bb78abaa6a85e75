use super::Lazy;
use crate::{entity::hydrate, Entity, Result, Store, Value};

use std::fmt;

/// Column wiring for a many-to-many pivot table.
#[derive(Debug, Clone, Copy)]
pub struct Pivot {
    /// The pivot table itself.
    pub table: &'static str,
    /// Pivot column holding the owning side's key.
    pub foreign_key: &'static str,
    /// Pivot column holding the related side's key.
    pub related_key: &'static str,
    /// Key column on the related table the pivot joins to.
    pub related_entity_key: &'static str,
}

/// Relationship cell for a many-to-many through a pivot table. Loads once
/// via a pivot join, caches the whole list.
#[derive(Clone)]
pub struct BelongsToMany<T> {
    cell: Lazy<Vec<T>>,
}

impl<T: Entity> BelongsToMany<T> {
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

    /// Resolves the related rows reachable through the pivot, caching the
    /// list (an empty one included).
    pub fn get_or_load(
        &mut self,
        db: &Store,
        pivot: Pivot,
        local_value: impl Into<Value>,
    ) -> Result<&[T]> {
        if !self.cell.is_loaded() {
            let related = T::table().name;
            let sql = format!(
                "SELECT {related}.* FROM {pivot} JOIN {related} ON {pivot}.{related_key} = {related}.{related_entity_key} WHERE {pivot}.{foreign_key} = ?",
                pivot = pivot.table,
                related_key = pivot.related_key,
                related_entity_key = pivot.related_entity_key,
                foreign_key = pivot.foreign_key,
            );
            let rows = db.fetch_rows(&sql, &[local_value.into()])?;
            self.cell = Lazy::Loaded(hydrate(&rows)?);
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

impl<T> Default for BelongsToMany<T> {
    fn default() -> Self {
        Self {
            cell: Lazy::NotLoaded,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BelongsToMany<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell {
            Lazy::NotLoaded => fmt.write_str("<not loaded>"),
            Lazy::Loaded(rows) => rows.fmt(fmt),
        }
    }
}
