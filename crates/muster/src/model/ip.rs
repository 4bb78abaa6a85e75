use chrono::NaiveDateTime;
use muster_db::{Entity, Record, Result, Table};

static TABLE: Table = Table {
    name: "ips",
    columns: &["id", "ip_address", "blacklisted", "created_at"],
    joins: &[],
};

/// An access-control entry for the API gate. A row either blacklists or
/// whitelists its address; `created_at` records when the decision was made.
#[derive(Debug, Clone)]
pub struct Ip {
    pub id: Option<i64>,
    pub ip_address: String,
    pub blacklisted: bool,
    pub created_at: NaiveDateTime,
}

impl Ip {
    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted
    }

    pub fn is_whitelisted(&self) -> bool {
        !self.blacklisted
    }
}

impl Entity for Ip {
    fn table() -> &'static Table {
        &TABLE
    }

    fn from_row(row: &Record) -> Result<Ip> {
        Ok(Ip {
            id: Some(row.i64("id")?),
            ip_address: row.text("ip_address")?,
            blacklisted: row.bool("blacklisted")?,
            created_at: row.date_time("created_at")?,
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("ip_address", self.ip_address.as_str())
            .set("blacklisted", self.blacklisted)
            .set("created_at", self.created_at)
            .drop_nulls()
    }
}
