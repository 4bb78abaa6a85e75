use chrono::{NaiveDate, NaiveDateTime};
use muster_db::{
    BelongsTo, BelongsToMany, Entity, Error, Filter, Pivot, Record, Result, Store, Table,
};

use crate::model::{EventParticipant, Location, Participant};

static TABLE: Table = Table {
    name: "events",
    columns: &["id", "name", "date", "location_id", "created_at"],
    joins: &[],
};

/// An event held at a location on a given date.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Option<i64>,
    pub name: String,
    pub date: NaiveDate,
    pub location_id: i64,
    pub created_at: NaiveDateTime,
    pub location: BelongsTo<Location>,
    pub participants: BelongsToMany<Participant>,
}

impl Event {
    /// Pivot wiring to the participants registered for this event.
    pub const PARTICIPANTS: Pivot = Pivot {
        table: "event_participants",
        foreign_key: "event_id",
        related_key: "participant_id",
        related_entity_key: "id",
    };

    /// The hosting location, resolved lazily and cached.
    pub fn location(&mut self, db: &Store) -> Result<Option<&Location>> {
        self.location.get_or_load(db, "id", self.location_id)
    }

    /// Participants registered for this event, resolved lazily and cached.
    pub fn participants(&mut self, db: &Store) -> Result<&[Participant]> {
        let Some(id) = self.id else { return Ok(&[]) };
        self.participants.get_or_load(db, Self::PARTICIPANTS, id)
    }

    /// The hosting location's capacity. An event whose location row is gone
    /// cannot answer this.
    pub fn capacity(&mut self, db: &Store) -> Result<i64> {
        let location_id = self.location_id;
        let location = self
            .location(db)?
            .ok_or_else(|| Error::record_not_found(format!("location {location_id}")))?;
        Ok(location.capacity)
    }

    /// Length of the lazily loaded participant list.
    pub fn participant_count(&mut self, db: &Store) -> Result<usize> {
        Ok(self.participants(db)?.len())
    }

    /// Registration count straight from the pivot table, bypassing the
    /// cached participant list.
    pub fn registration_count(&self, db: &Store) -> Result<u64> {
        let Some(id) = self.id else { return Ok(0) };
        let clause = Filter::new().and_where("event_id", "=", id).build();
        db.count::<EventParticipant>(&clause)
    }

    /// Occupancy as a percentage of the location's capacity.
    pub fn capacity_rate(&mut self, db: &Store) -> Result<f64> {
        let capacity = self.capacity(db)?;
        let count = self.participant_count(db)?;
        Ok(count as f64 * 100.0 / capacity as f64)
    }

    /// Occupancy rounded up and rendered for display, e.g. `"67%"`.
    pub fn capacity_rate_percent(&mut self, db: &Store) -> Result<String> {
        Ok(format!("{}%", self.capacity_rate(db)?.ceil()))
    }
}

impl Entity for Event {
    fn table() -> &'static Table {
        &TABLE
    }

    fn from_row(row: &Record) -> Result<Event> {
        Ok(Event {
            id: Some(row.i64("id")?),
            name: row.text("name")?,
            date: row.date("date")?,
            location_id: row.i64("location_id")?,
            created_at: row.date_time("created_at")?,
            location: BelongsTo::new(),
            participants: BelongsToMany::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("name", self.name.as_str())
            .set("date", self.date)
            .set("location_id", self.location_id)
            .set("created_at", self.created_at)
            .drop_nulls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muster_db::Store;

    fn store() -> Store {
        let db = Store::in_memory().unwrap();
        db.migrate(crate::SCHEMA).unwrap();
        db
    }

    fn seed(db: &Store, capacity: i64) -> Event {
        let location: Location = db
            .create(
                Record::new()
                    .set("name", "Hall")
                    .set("address", "1 Main St")
                    .set("capacity", capacity),
            )
            .unwrap();
        db.create(
            Record::new()
                .set("name", "RustConf")
                .set("date", "2024-06-01")
                .set("location_id", location.id.unwrap()),
        )
        .unwrap()
    }

    fn register(db: &Store, event: &Event, email: &str) {
        let participant: Participant = db
            .create(Record::new().set("name", "P").set("email", email))
            .unwrap();
        let _: EventParticipant = db
            .create(
                Record::new()
                    .set("event_id", event.id.unwrap())
                    .set("participant_id", participant.id.unwrap()),
            )
            .unwrap();
    }

    #[test]
    fn capacity_comes_from_the_location() {
        let db = store();
        let mut event = seed(&db, 10);
        assert_eq!(event.capacity(&db).unwrap(), 10);
    }

    #[test]
    fn capacity_rate_is_a_percentage_of_the_location_capacity() {
        let db = store();
        let mut event = seed(&db, 3);
        register(&db, &event, "a@example.com");
        register(&db, &event, "b@example.com");

        assert_eq!(event.participant_count(&db).unwrap(), 2);
        let rate = event.capacity_rate(&db).unwrap();
        assert!((rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(event.capacity_rate_percent(&db).unwrap(), "67%");
    }

    #[test]
    fn registration_count_bypasses_the_cached_participant_list() {
        let db = store();
        let mut event = seed(&db, 10);
        register(&db, &event, "a@example.com");
        assert_eq!(event.participant_count(&db).unwrap(), 1);

        register(&db, &event, "b@example.com");
        // The lazy list stays cached at 1; the pivot count sees the new row.
        assert_eq!(event.participant_count(&db).unwrap(), 1);
        assert_eq!(event.registration_count(&db).unwrap(), 2);
    }

    #[test]
    fn capacity_of_a_missing_location_is_an_error() {
        let db = store();
        let mut event: Event = db
            .create(
                Record::new()
                    .set("name", "Orphan")
                    .set("date", "2024-06-01")
                    .set("location_id", 999),
            )
            .unwrap();
        assert!(event.capacity(&db).is_err());
    }
}
