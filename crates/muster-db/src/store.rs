use crate::{
    entity::hydrate, Cond, Connective, Entity, Filter, Record, Result, Value, WhereClause,
    DATETIME_FORMAT,
};

use chrono::Local;
use rusqlite::{params_from_iter, Connection, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Handle to the SQLite database.
///
/// One connection shared process-wide behind a mutex; every statement runs to
/// completion while the lock is held. [`Store::transaction`] keeps the lock
/// for the whole transaction and hands out a [`Session`] — statements inside
/// the closure must go through that session, never back through the store.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Store> {
        Ok(Store::prepare(Connection::open(path)?))
    }

    /// Opens a fresh in-memory database.
    pub fn in_memory() -> Result<Store> {
        Ok(Store::prepare(Connection::open_in_memory()?))
    }

    fn prepare(conn: Connection) -> Store {
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", "5000");
        // The bundled SQLite is compiled with SQLITE_DEFAULT_FOREIGN_KEYS=1;
        // keep stock SQLite's default — cascades are the application's job.
        let _ = conn.pragma_update(None, "foreign_keys", "OFF");
        Store {
            conn: Mutex::new(conn),
        }
    }

    /// Applies a static schema file as a single batch.
    pub fn migrate(&self, sql: &str) -> Result<()> {
        self.lock().execute_batch(sql)?;
        info!("schema applied");
        Ok(())
    }

    /// Runs `f` inside an immediate transaction: commits on `Ok`, rolls back
    /// on `Err`. The connection lock is held for the whole closure.
    pub fn transaction<R, E>(
        &self,
        f: impl FnOnce(&Session<'_>) -> core::result::Result<R, E>,
    ) -> core::result::Result<R, E>
    where
        E: From<crate::Error>,
    {
        let mut conn = self.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(crate::Error::from)?;
        match f(&Session::new(&tx)) {
            Ok(value) => {
                tx.commit().map_err(crate::Error::from)?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback();
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("store mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn with_session<R>(&self, f: impl FnOnce(&Session<'_>) -> Result<R>) -> Result<R> {
        let conn = self.lock();
        f(&Session::new(&conn))
    }

    /// Every row of the table, hydrated, in store order.
    pub fn all<T: Entity>(&self) -> Result<Vec<T>> {
        self.with_session(|session| session.all())
    }

    /// Rows matching a condition map; see [`Session::select`].
    pub fn select<T: Entity>(
        &self,
        conditions: &[(&str, Cond)],
        connective: Connective,
    ) -> Result<Vec<T>> {
        self.with_session(|session| session.select(conditions, connective))
    }

    /// `SELECT *` with the given clause, hydrated.
    pub fn query<T: Entity>(&self, clause: &WhereClause) -> Result<Vec<T>> {
        self.with_session(|session| session.query(clause))
    }

    /// The raw-read escape hatch; see [`Session::query_with`].
    pub fn query_with<T: Entity, R>(
        &self,
        select_prefix: &str,
        clause: &WhereClause,
        resolve: impl FnOnce(Vec<Record>) -> Result<R>,
    ) -> Result<R> {
        self.with_session(|session| session.query_with::<T, R>(select_prefix, clause, resolve))
    }

    /// `COUNT(*)` behind the same clause abstraction as every other read.
    pub fn count<T: Entity>(&self, clause: &WhereClause) -> Result<u64> {
        self.with_session(|session| session.count::<T>(clause))
    }

    /// One entity by id, or `None`.
    pub fn find<T: Entity>(&self, id: i64) -> Result<Option<T>> {
        self.with_session(|session| session.find(id))
    }

    /// First entity matching `column op value`, or `None`.
    pub fn find_by<T: Entity>(
        &self,
        column: &str,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Option<T>> {
        let value = value.into();
        self.with_session(|session| session.find_by(column, op, value))
    }

    /// Inserts and hydrates; see [`Session::create`].
    pub fn create<T: Entity>(&self, fields: Record) -> Result<T> {
        self.with_session(|session| session.create(fields))
    }

    /// Updates the given fields by id; see [`Session::update`].
    pub fn update<T: Entity>(&self, entity: &T, fields: &Record) -> Result<usize> {
        self.with_session(|session| session.update(entity, fields))
    }

    /// Deletes by id; see [`Session::delete`].
    pub fn delete<T: Entity>(&self, entity: &T) -> Result<usize> {
        self.with_session(|session| session.delete(entity))
    }

    /// Re-fetches an entity's row by id: a new, independent instance.
    pub fn fresh<T: Entity>(&self, entity: &T) -> Result<Option<T>> {
        self.with_session(|session| session.fresh(entity))
    }

    /// Fetches every row of a parameterized statement as field maps.
    pub fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        self.with_session(|session| session.fetch_rows(sql, params))
    }

    /// Executes a parameterized statement, returning the affected-row count.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.with_session(|session| session.execute(sql, params))
    }
}

/// A borrowed connection carrying the whole typed query surface. Handed to
/// [`Store::transaction`] closures; the store routes through one internally
/// for every standalone call.
pub struct Session<'a> {
    conn: &'a Connection,
}

impl<'a> Session<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Session<'a> {
        Session { conn }
    }

    /// Every row of the table, hydrated, in store order.
    pub fn all<T: Entity>(&self) -> Result<Vec<T>> {
        self.query(&WhereClause::empty())
    }

    /// Rows matching a condition map: a plain value means equality, two
    /// elements mean `(operator, value)`. Conditions combine with
    /// `connective`.
    pub fn select<T: Entity>(
        &self,
        conditions: &[(&str, Cond)],
        connective: Connective,
    ) -> Result<Vec<T>> {
        let mut filter = Filter::new();
        for (field, cond) in conditions {
            let (op, value) = cond.parts();
            filter = match connective {
                Connective::And => filter.and_where(field, op, value.clone()),
                Connective::Or => filter.or_where(field, op, value.clone()),
            };
        }
        self.query(&filter.build())
    }

    /// `SELECT *` with the given clause, hydrated.
    pub fn query<T: Entity>(&self, clause: &WhereClause) -> Result<Vec<T>> {
        self.query_with::<T, _>("SELECT * FROM", clause, |rows| hydrate(&rows))
    }

    /// The shared primitive under every read: `select_prefix` + the table
    /// (with its static joins) + the clause, with `resolve` applied to the
    /// raw rows.
    pub fn query_with<T: Entity, R>(
        &self,
        select_prefix: &str,
        clause: &WhereClause,
        resolve: impl FnOnce(Vec<Record>) -> Result<R>,
    ) -> Result<R> {
        let table = T::table();
        let sql = join_sql(&[select_prefix, &table.from_clause(), clause.sql()]);
        let rows = self.fetch_rows(&sql, clause.values())?;
        resolve(rows)
    }

    /// `COUNT(*)` with the given clause; 0 when the aggregate is absent.
    pub fn count<T: Entity>(&self, clause: &WhereClause) -> Result<u64> {
        self.query_with::<T, _>("SELECT COUNT(*) AS count FROM", clause, |rows| {
            Ok(match rows.first() {
                Some(row) => row.i64("count")? as u64,
                None => 0,
            })
        })
    }

    /// One entity by id, or `None`.
    pub fn find<T: Entity>(&self, id: i64) -> Result<Option<T>> {
        self.find_by("id", "=", id)
    }

    /// First entity matching `column op value`, or `None`.
    pub fn find_by<T: Entity>(
        &self,
        column: &str,
        op: &str,
        value: impl Into<Value>,
    ) -> Result<Option<T>> {
        let clause = Filter::new().and_where(column, op, value).build();
        Ok(self.query(&clause)?.into_iter().next())
    }

    /// Inserts `fields` with a freshly stamped `created_at`, then hydrates
    /// from the field map merged with the new rowid. The row is not re-read,
    /// so store-side defaults on other columns are not reflected.
    pub fn create<T: Entity>(&self, fields: Record) -> Result<T> {
        let mut fields = fields;
        fields.insert(
            "created_at",
            Local::now().naive_local().format(DATETIME_FORMAT).to_string(),
        );

        let columns: Vec<&str> = fields.columns().collect();
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::table().name,
            columns.join(", "),
            placeholders,
        );
        let values: Vec<Value> = fields.values().cloned().collect();
        self.execute(&sql, &values)?;
        let id = self.conn.last_insert_rowid();

        let mut row = fields;
        row.insert("id", id);
        T::from_row(&row)
    }

    /// `UPDATE` over exactly the given fields, by id. Returns the number of
    /// rows affected; an instance without an id affects nothing.
    pub fn update<T: Entity>(&self, entity: &T, fields: &Record) -> Result<usize> {
        let Some(id) = entity.id() else { return Ok(0) };
        let assignments: Vec<String> = fields
            .columns()
            .map(|column| format!("{column} = ?"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            T::table().name,
            assignments.join(", "),
        );
        let mut params: Vec<Value> = fields.values().cloned().collect();
        params.push(Value::I64(id));
        self.execute(&sql, &params)
    }

    /// `DELETE` by id. Returns the number of rows affected; an instance
    /// without an id is a no-op reporting 0.
    pub fn delete<T: Entity>(&self, entity: &T) -> Result<usize> {
        let Some(id) = entity.id() else { return Ok(0) };
        let sql = format!("DELETE FROM {} WHERE id = ?", T::table().name);
        self.execute(&sql, &[Value::I64(id)])
    }

    /// Re-fetches an entity's row by id: a new, independent instance.
    pub fn fresh<T: Entity>(&self, entity: &T) -> Result<Option<T>> {
        match entity.id() {
            Some(id) => self.find(id),
            None => Ok(None),
        }
    }

    /// Fetches every row of a parameterized statement as field maps, columns
    /// in statement order.
    pub fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>> {
        debug!(sql, "fetch");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|column| column.to_string())
            .collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut record = Record::new();
                    for (index, column) in columns.iter().enumerate() {
                        record.insert(column.clone(), Value::from_sql(row.get_ref(index)?)?);
                    }
                    out.push(record);
                }
                Ok(None) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(out)
    }

    /// Executes a parameterized statement, returning the affected-row count.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!(sql, "execute");
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }
}

fn join_sql(parts: &[&str]) -> String {
    let mut sql = String::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if !sql.is_empty() {
            sql.push(' ');
        }
        sql.push_str(part);
    }
    sql
}
