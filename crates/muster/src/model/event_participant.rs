use chrono::NaiveDateTime;
use muster_db::{BelongsTo, Entity, Record, Result, Store, Table};

use crate::model::{Event, Participant};

static TABLE: Table = Table {
    name: "event_participants",
    columns: &["id", "event_id", "participant_id", "created_at"],
    joins: &[],
};

/// One registration: a participant holding a seat for an event. The row
/// carries its own identifier, and `created_at` doubles as the registration
/// timestamp.
#[derive(Debug, Clone)]
pub struct EventParticipant {
    pub id: Option<i64>,
    pub event_id: i64,
    pub participant_id: i64,
    pub created_at: NaiveDateTime,
    pub event: BelongsTo<Event>,
    pub participant: BelongsTo<Participant>,
}

impl EventParticipant {
    /// The event side of the registration, resolved lazily and cached.
    pub fn event(&mut self, db: &Store) -> Result<Option<&Event>> {
        self.event.get_or_load(db, "id", self.event_id)
    }

    /// The participant side of the registration, resolved lazily and cached.
    pub fn participant(&mut self, db: &Store) -> Result<Option<&Participant>> {
        self.participant.get_or_load(db, "id", self.participant_id)
    }
}

impl Entity for EventParticipant {
    fn table() -> &'static Table {
        &TABLE
    }

    fn from_row(row: &Record) -> Result<EventParticipant> {
        Ok(EventParticipant {
            id: Some(row.i64("id")?),
            event_id: row.i64("event_id")?,
            participant_id: row.i64("participant_id")?,
            created_at: row.date_time("created_at")?,
            event: BelongsTo::new(),
            participant: BelongsTo::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("event_id", self.event_id)
            .set("participant_id", self.participant_id)
            .set("created_at", self.created_at)
            .drop_nulls()
    }
}
