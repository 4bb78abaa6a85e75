use chrono::NaiveDateTime;
use muster_db::{BelongsToMany, Entity, Pivot, Record, Result, Store, Table};

use crate::model::Event;

static TABLE: Table = Table {
    name: "participants",
    columns: &["id", "name", "email", "created_at"],
    joins: &[],
};

/// A person who can register for events.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub events: BelongsToMany<Event>,
}

impl Participant {
    /// Pivot wiring to the events this participant registered for.
    pub const EVENTS: Pivot = Pivot {
        table: "event_participants",
        foreign_key: "participant_id",
        related_key: "event_id",
        related_entity_key: "id",
    };

    /// Events this participant registered for, resolved lazily and cached.
    pub fn events(&mut self, db: &Store) -> Result<&[Event]> {
        let Some(id) = self.id else { return Ok(&[]) };
        self.events.get_or_load(db, Self::EVENTS, id)
    }
}

impl Entity for Participant {
    fn table() -> &'static Table {
        &TABLE
    }

    fn from_row(row: &Record) -> Result<Participant> {
        Ok(Participant {
            id: Some(row.i64("id")?),
            name: row.text("name")?,
            email: row.text("email")?,
            created_at: row.date_time("created_at")?,
            events: BelongsToMany::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("name", self.name.as_str())
            .set("email", self.email.as_str())
            .set("created_at", self.created_at)
            .drop_nulls()
    }
}
