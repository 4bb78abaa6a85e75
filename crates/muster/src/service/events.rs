use chrono::NaiveDate;
use muster_db::{Record, Result, Store, WhereClause};

use crate::model::Event;

/// Use cases over event rows.
pub struct EventService<'a> {
    db: &'a Store,
}

impl<'a> EventService<'a> {
    pub fn new(db: &'a Store) -> EventService<'a> {
        EventService { db }
    }

    pub fn get(&self, clause: &WhereClause) -> Result<Vec<Event>> {
        self.db.query(clause)
    }

    pub fn find(&self, id: i64) -> Result<Option<Event>> {
        self.db.find(id)
    }

    pub fn create(&self, name: &str, date: NaiveDate, location_id: i64) -> Result<Event> {
        self.db.create(
            Record::new()
                .set("name", name)
                .set("date", date)
                .set("location_id", location_id),
        )
    }

    /// Writes the new field values and re-fetches the row.
    pub fn update(
        &self,
        event: &Event,
        name: &str,
        date: NaiveDate,
        location_id: i64,
    ) -> Result<Option<Event>> {
        self.db.update(
            event,
            &Record::new()
                .set("name", name)
                .set("date", date)
                .set("location_id", location_id),
        )?;
        self.db.fresh(event)
    }

    /// Deletes the event row. Registrations pointing at it are left in
    /// place.
    pub fn delete(&self, event: &Event) -> Result<usize> {
        self.db.delete(event)
    }
}
