use muster_db::{Connective, Filter, Record, Result, Store, WhereClause};

use crate::model::Ip;

/// Use cases over the API access-control list.
pub struct IpService<'a> {
    db: &'a Store,
}

impl<'a> IpService<'a> {
    pub fn new(db: &'a Store) -> IpService<'a> {
        IpService { db }
    }

    pub fn get(&self, clause: &WhereClause) -> Result<Vec<Ip>> {
        self.db.query(clause)
    }

    pub fn find(&self, id: i64) -> Result<Option<Ip>> {
        self.db.find(id)
    }

    /// The entry for an address, if one exists.
    pub fn find_by_ip(&self, ip_address: &str) -> Result<Option<Ip>> {
        let clause = Filter::new()
            .where_string("ip_address", ip_address, Connective::And)
            .build();
        Ok(self.db.query(&clause)?.into_iter().next())
    }

    pub fn create(&self, ip_address: &str, blacklisted: bool) -> Result<Ip> {
        self.db.create(
            Record::new()
                .set("ip_address", ip_address)
                .set("blacklisted", blacklisted),
        )
    }

    pub fn delete(&self, ip: &Ip) -> Result<usize> {
        self.db.delete(ip)
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

    #[test]
    fn find_by_ip_matches_the_exact_address() {
        let db = store();
        let service = IpService::new(&db);
        service.create("10.0.0.1", true).unwrap();
        service.create("10.0.0.12", false).unwrap();

        let found = service.find_by_ip("10.0.0.1").unwrap().unwrap();
        assert_eq!(found.ip_address, "10.0.0.1");
        assert!(found.is_blacklisted());
        assert!(service.find_by_ip("10.0.0.9").unwrap().is_none());
    }
}
