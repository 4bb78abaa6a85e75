use muster_db::{Record, Result, Store, WhereClause};

use crate::model::Participant;

/// Use cases over participant rows.
pub struct ParticipantService<'a> {
    db: &'a Store,
}

impl<'a> ParticipantService<'a> {
    pub fn new(db: &'a Store) -> ParticipantService<'a> {
        ParticipantService { db }
    }

    pub fn get(&self, clause: &WhereClause) -> Result<Vec<Participant>> {
        self.db.query(clause)
    }

    pub fn find(&self, id: i64) -> Result<Option<Participant>> {
        self.db.find(id)
    }

    pub fn create(&self, name: &str, email: &str) -> Result<Participant> {
        self.db
            .create(Record::new().set("name", name).set("email", email))
    }

    /// Writes the new field values and re-fetches the row.
    pub fn update(
        &self,
        participant: &Participant,
        name: &str,
        email: &str,
    ) -> Result<Option<Participant>> {
        self.db.update(
            participant,
            &Record::new().set("name", name).set("email", email),
        )?;
        self.db.fresh(participant)
    }

    pub fn delete(&self, participant: &Participant) -> Result<usize> {
        self.db.delete(participant)
    }
}
