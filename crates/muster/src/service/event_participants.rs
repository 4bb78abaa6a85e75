use muster_db::{Error as DbError, Filter, Record, Result, Store, WhereClause};
use thiserror::Error;

use crate::model::{Event, EventParticipant, Location, Participant};

/// Why a registration was refused.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Already reserved a seat for the event")]
    AlreadyRegistered,
    #[error("The event reached it's maximum capacity")]
    CapacityFull,
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Use cases over registrations.
pub struct EventParticipantService<'a> {
    db: &'a Store,
}

impl<'a> EventParticipantService<'a> {
    pub fn new(db: &'a Store) -> EventParticipantService<'a> {
        EventParticipantService { db }
    }

    pub fn get(&self, clause: &WhereClause) -> Result<Vec<EventParticipant>> {
        self.db.query(clause)
    }

    pub fn find(&self, id: i64) -> Result<Option<EventParticipant>> {
        self.db.find(id)
    }

    /// Registers `participant` for `event` inside one immediate transaction.
    ///
    /// The duplicate and capacity checks run against current rows while the
    /// transaction holds the write lock, so two concurrent registrations
    /// cannot both take the last admissible seat. Admission requires
    /// `taken + 1 < capacity`, so the final seat of a location is never
    /// handed out.
    pub fn register(
        &self,
        event: &Event,
        participant: &Participant,
    ) -> core::result::Result<EventParticipant, RegisterError> {
        let (Some(event_id), Some(participant_id)) = (event.id, participant.id) else {
            return Err(DbError::record_not_found("unsaved event or participant").into());
        };
        let location_id = event.location_id;

        self.db.transaction(|session| {
            let duplicate = session.count::<EventParticipant>(
                &Filter::new()
                    .and_where("event_id", "=", event_id)
                    .and_where("participant_id", "=", participant_id)
                    .build(),
            )?;
            if duplicate > 0 {
                return Err(RegisterError::AlreadyRegistered);
            }

            let location: Location = session
                .find(location_id)?
                .ok_or_else(|| DbError::record_not_found(format!("location {location_id}")))?;
            let taken = session.count::<EventParticipant>(
                &Filter::new().and_where("event_id", "=", event_id).build(),
            )?;
            if taken as i64 + 1 >= location.capacity {
                return Err(RegisterError::CapacityFull);
            }

            Ok(session.create(
                Record::new()
                    .set("event_id", event_id)
                    .set("participant_id", participant_id),
            )?)
        })
    }

    pub fn delete(&self, registration: &EventParticipant) -> Result<usize> {
        self.db.delete(registration)
    }
}
