mod support;

use support::{seed_todo, seed_user, store, Todo, TodoWithOwner, User};

use muster_db::{Cond, Connective, Entity, Filter, Record, Store, Value};
use pretty_assertions::assert_eq;

#[test]
fn create_then_find_round_trip() {
    let db = store();
    let created = seed_user(&db, "ada", "ada@example.com");
    let id = created.id.unwrap();

    let found: User = db.find(id).unwrap().unwrap();
    assert_eq!(found.name, "ada");
    assert_eq!(found.email, "ada@example.com");
    assert_eq!(found.to_record(), created.to_record());

    // The stamp is server-assigned and must parse in storage format.
    chrono::NaiveDateTime::parse_from_str(&found.created_at, muster_db::DATETIME_FORMAT).unwrap();
}

#[test]
fn create_stamps_created_at_even_when_supplied() {
    let db = store();
    let user: User = db
        .create(
            Record::new()
                .set("name", "ada")
                .set("email", "ada@example.com")
                .set("created_at", "1999-01-01 00:00:00"),
        )
        .unwrap();

    assert_ne!(user.created_at, "1999-01-01 00:00:00");
}

#[test]
fn update_then_fresh_reflects_exactly_the_updated_fields() {
    let db = store();
    let user = seed_user(&db, "ada", "ada@example.com");

    let affected = db
        .update(&user, &Record::new().set("email", "countess@example.com"))
        .unwrap();
    assert_eq!(affected, 1);

    let fresh: User = db.fresh(&user).unwrap().unwrap();
    assert_eq!(fresh.email, "countess@example.com");
    assert_eq!(fresh.name, "ada");

    // The original instance is untouched.
    assert_eq!(user.email, "ada@example.com");
}

#[test]
fn update_without_id_affects_nothing() {
    let db = store();
    let mut user = seed_user(&db, "ada", "ada@example.com");
    user.id = None;

    let affected = db.update(&user, &Record::new().set("name", "x")).unwrap();
    assert_eq!(affected, 0);
}

#[test]
fn delete_removes_exactly_that_row() {
    let db = store();
    let keep = seed_user(&db, "ada", "ada@example.com");
    let gone = seed_user(&db, "brian", "brian@example.com");

    assert_eq!(db.delete(&gone).unwrap(), 1);
    assert!(db.find::<User>(gone.id.unwrap()).unwrap().is_none());
    assert!(db.find::<User>(keep.id.unwrap()).unwrap().is_some());
}

#[test]
fn delete_without_id_is_a_no_op() {
    let db = store();
    let mut user = seed_user(&db, "ada", "ada@example.com");
    user.id = None;

    assert_eq!(db.delete(&user).unwrap(), 0);
    assert_eq!(db.all::<User>().unwrap().len(), 1);
}

#[test]
fn all_returns_rows_in_store_order() {
    let db = store();
    seed_user(&db, "a", "a@example.com");
    seed_user(&db, "b", "b@example.com");
    seed_user(&db, "c", "c@example.com");

    let names: Vec<String> = db
        .all::<User>()
        .unwrap()
        .into_iter()
        .map(|user| user.name)
        .collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn select_with_condition_map() {
    let db = store();
    let ada = seed_user(&db, "ada", "ada@example.com");
    seed_user(&db, "brian", "brian@example.com");
    seed_todo(&db, ada.id.unwrap(), "write notes");

    let rows: Vec<User> = db
        .select(&[("name", Cond::eq("ada"))], Connective::And)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].email, "ada@example.com");

    let rows: Vec<User> = db
        .select(
            &[("name", Cond::eq("ada")), ("name", Cond::eq("brian"))],
            Connective::Or,
        )
        .unwrap();
    assert_eq!(rows.len(), 2);

    let rows: Vec<Todo> = db
        .select(&[("id", Cond::cmp(">", 0))], Connective::And)
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn find_by_takes_the_first_match() {
    let db = store();
    seed_user(&db, "ada", "dup@example.com");
    seed_user(&db, "brian", "dup@example.com");

    let found: User = db.find_by("email", "=", "dup@example.com").unwrap().unwrap();
    assert_eq!(found.name, "ada");

    let none: Option<User> = db.find_by("email", "=", "missing@example.com").unwrap();
    assert!(none.is_none());
}

#[test]
fn count_goes_through_the_filter_abstraction() {
    let db = store();
    seed_user(&db, "ada", "ada@example.com");
    seed_user(&db, "adele", "adele@example.com");
    seed_user(&db, "brian", "brian@example.com");

    let clause = Filter::new()
        .where_string_starts_with("name", "ad", Connective::And)
        .build();
    assert_eq!(db.count::<User>(&clause).unwrap(), 2);

    let none = Filter::new().and_where("name", "=", "nobody").build();
    assert_eq!(db.count::<User>(&none).unwrap(), 0);
}

#[test]
fn query_with_resolves_raw_rows() {
    let db = store();
    seed_user(&db, "ada", "ada@example.com");
    seed_user(&db, "brian", "brian@example.com");

    let emails: Vec<String> = db
        .query_with::<User, _>(
            "SELECT email FROM",
            &Filter::new().and_where("name", "=", "ada").build(),
            |rows| rows.iter().map(|row| row.text("email")).collect(),
        )
        .unwrap();
    assert_eq!(emails, ["ada@example.com"]);
}

#[test]
fn static_joins_are_applied_to_reads() {
    let db = store();
    let ada = seed_user(&db, "ada", "ada@example.com");
    seed_todo(&db, ada.id.unwrap(), "write notes");

    let rows: Vec<TodoWithOwner> = db
        .query(&Filter::new().and_where("title", "=", "write notes").build())
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].owner_email, "ada@example.com");
}

#[test]
fn transaction_commits_on_ok() {
    let db = store();
    db.transaction(|session| -> muster_db::Result<()> {
        session.create::<User>(
            Record::new()
                .set("name", "ada")
                .set("email", "ada@example.com"),
        )?;
        Ok(())
    })
    .unwrap();

    assert_eq!(db.all::<User>().unwrap().len(), 1);
}

#[test]
fn transaction_rolls_back_on_err() {
    let db = store();
    let result = db.transaction(|session| -> muster_db::Result<()> {
        session.create::<User>(
            Record::new()
                .set("name", "ada")
                .set("email", "ada@example.com"),
        )?;
        Err(muster_db::Error::record_not_found("forced"))
    });

    assert!(result.is_err());
    assert!(db.all::<User>().unwrap().is_empty());
}

#[test]
fn bound_values_reach_the_driver_positionally() {
    let db = store();
    seed_user(&db, "ada", "ada@example.com");
    seed_user(&db, "brian", "brian@example.com");

    let rows = db
        .fetch_rows(
            "SELECT name FROM users WHERE name = ? OR email = ?",
            &[Value::Text("ada".into()), Value::Text("brian@example.com".into())],
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn store_is_shareable_across_threads() {
    let db = std::sync::Arc::new(store());
    let mut handles = Vec::new();
    for n in 0..4 {
        let db = db.clone();
        handles.push(std::thread::spawn(move || {
            seed_user(&db, &format!("user-{n}"), &format!("u{n}@example.com"));
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(db.all::<User>().unwrap().len(), 4);
}

fn _assert_send_sync(store: Store) {
    fn takes<T: Send + Sync>(_: T) {}
    takes(store);
}
