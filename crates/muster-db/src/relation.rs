mod belongs_to;
pub use belongs_to::BelongsTo;

mod belongs_to_many;
pub use belongs_to_many::{BelongsToMany, Pivot};

mod has_many;
pub use has_many::HasMany;

mod has_one;
pub use has_one::HasOne;

/// Cache slot backing every relationship cell.
///
/// Explicitly distinguishes "never fetched" from "fetched and found
/// nothing": a loaded-but-empty result is authoritative and is not fetched
/// again.
#[derive(Debug, Clone, PartialEq)]
enum Lazy<T> {
    NotLoaded,
    Loaded(T),
}

impl<T> Lazy<T> {
    fn is_loaded(&self) -> bool {
        matches!(self, Lazy::Loaded(_))
    }
}

impl<T> Default for Lazy<T> {
    fn default() -> Self {
        Lazy::NotLoaded
    }
}
