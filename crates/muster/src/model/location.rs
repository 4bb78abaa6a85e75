use chrono::NaiveDateTime;
use muster_db::{Entity, HasMany, Record, Result, Store, Table};

use crate::model::Event;

static TABLE: Table = Table {
    name: "locations",
    columns: &["id", "name", "address", "capacity", "created_at"],
    joins: &[],
};

/// A venue events are held at. `capacity` bounds how many participants the
/// events hosted there admit.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: Option<i64>,
    pub name: String,
    pub address: String,
    pub capacity: i64,
    pub created_at: NaiveDateTime,
    pub events: HasMany<Event>,
}

impl Location {
    /// Events held at this location, resolved lazily and cached.
    pub fn events(&mut self, db: &Store) -> Result<&[Event]> {
        let Some(id) = self.id else { return Ok(&[]) };
        self.events.get_or_load(db, "location_id", id)
    }
}

impl Entity for Location {
    fn table() -> &'static Table {
        &TABLE
    }

    fn from_row(row: &Record) -> Result<Location> {
        Ok(Location {
            id: Some(row.i64("id")?),
            name: row.text("name")?,
            address: row.text("address")?,
            capacity: row.i64("capacity")?,
            created_at: row.date_time("created_at")?,
            events: HasMany::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("name", self.name.as_str())
            .set("address", self.address.as_str())
            .set("capacity", self.capacity)
            .set("created_at", self.created_at)
            .drop_nulls()
    }
}
