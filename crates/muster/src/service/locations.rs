use muster_db::{Record, Result, Store, WhereClause};

use crate::model::Location;
use crate::service::EventService;

/// Use cases over location rows.
pub struct LocationService<'a> {
    db: &'a Store,
}

impl<'a> LocationService<'a> {
    pub fn new(db: &'a Store) -> LocationService<'a> {
        LocationService { db }
    }

    pub fn get(&self, clause: &WhereClause) -> Result<Vec<Location>> {
        self.db.query(clause)
    }

    pub fn find(&self, id: i64) -> Result<Option<Location>> {
        self.db.find(id)
    }

    pub fn create(&self, name: &str, address: &str, capacity: i64) -> Result<Location> {
        self.db.create(
            Record::new()
                .set("name", name)
                .set("address", address)
                .set("capacity", capacity),
        )
    }

    /// Writes the new field values and re-fetches the row.
    pub fn update(
        &self,
        location: &Location,
        name: &str,
        address: &str,
        capacity: i64,
    ) -> Result<Option<Location>> {
        self.db.update(
            location,
            &Record::new()
                .set("name", name)
                .set("address", address)
                .set("capacity", capacity),
        )?;
        self.db.fresh(location)
    }

    /// Deletes the location after deleting every event held there.
    pub fn delete(&self, location: &mut Location) -> Result<usize> {
        let events = EventService::new(self.db);
        for event in location.events(self.db)?.to_vec() {
            events.delete(&event)?;
        }
        self.db.delete(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Event;
    use muster_db::{Store, WhereClause};

    fn store() -> Store {
        let db = Store::in_memory().unwrap();
        db.migrate(crate::SCHEMA).unwrap();
        db
    }

    #[test]
    fn deleting_a_location_deletes_its_events() {
        let db = store();
        let service = LocationService::new(&db);
        let mut location = service.create("Hall", "1 Main St", 50).unwrap();
        let events = EventService::new(&db);
        let date = "2024-06-01".parse().unwrap();
        events.create("A", date, location.id.unwrap()).unwrap();
        events.create("B", date, location.id.unwrap()).unwrap();

        service.delete(&mut location).unwrap();

        assert_eq!(db.count::<Event>(&WhereClause::empty()).unwrap(), 0);
        assert_eq!(db.count::<Location>(&WhereClause::empty()).unwrap(), 0);
    }

    #[test]
    fn event_registrations_survive_the_cascade() {
        let db = store();
        let service = LocationService::new(&db);
        let mut location = service.create("Hall", "1 Main St", 50).unwrap();
        let events = EventService::new(&db);
        let event = events
            .create("A", "2024-06-01".parse().unwrap(), location.id.unwrap())
            .unwrap();
        db.execute(
            "INSERT INTO event_participants (event_id, participant_id, created_at) VALUES (?, ?, ?)",
            &[
                event.id.unwrap().into(),
                7.into(),
                "2024-01-01 00:00:00".into(),
            ],
        )
        .unwrap();

        service.delete(&mut location).unwrap();

        // Registration rows are left behind when their event goes away.
        let orphans = db
            .fetch_rows("SELECT * FROM event_participants", &[])
            .unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(db.count::<Event>(&WhereClause::empty()).unwrap(), 0);
    }
}
