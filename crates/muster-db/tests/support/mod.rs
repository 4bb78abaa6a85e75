#![allow(dead_code)]

use muster_db::relation::{BelongsTo, BelongsToMany, HasMany, HasOne, Pivot};
use muster_db::{Entity, Record, Result, Store, Table};

pub const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        done INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        label TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE todo_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        todo_id INTEGER NOT NULL,
        tag_id INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
";

pub fn store() -> Store {
    let store = Store::in_memory().unwrap();
    store.migrate(SCHEMA).unwrap();
    store
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub todos: HasMany<Todo>,
    pub latest_todo: HasOne<Todo>,
}

static USERS: Table = Table {
    name: "users",
    columns: &["id", "name", "email", "created_at"],
    joins: &[],
};

impl Entity for User {
    fn table() -> &'static Table {
        &USERS
    }

    fn from_row(row: &Record) -> Result<Self> {
        Ok(User {
            id: Some(row.i64("id")?),
            name: row.text("name")?,
            email: row.text("email")?,
            created_at: row.text("created_at")?,
            todos: HasMany::new(),
            latest_todo: HasOne::new(),
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
            .set("created_at", self.created_at.as_str())
    }
}

impl User {
    pub fn todos(&mut self, db: &Store) -> Result<&[Todo]> {
        self.todos.get_or_load(db, "user_id", self.id)
    }

    pub fn latest_todo(&mut self, db: &Store) -> Result<Option<&Todo>> {
        self.latest_todo.get_or_load(db, "user_id", self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Todo {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub done: bool,
    pub created_at: String,
    pub user: BelongsTo<User>,
    pub tags: BelongsToMany<Tag>,
}

static TODOS: Table = Table {
    name: "todos",
    columns: &["id", "user_id", "title", "done", "created_at"],
    joins: &[],
};

pub const TODO_TAGS: Pivot = Pivot {
    table: "todo_tags",
    foreign_key: "todo_id",
    related_key: "tag_id",
    related_entity_key: "id",
};

pub const TAG_TODOS: Pivot = Pivot {
    table: "todo_tags",
    foreign_key: "tag_id",
    related_key: "todo_id",
    related_entity_key: "id",
};

impl Entity for Todo {
    fn table() -> &'static Table {
        &TODOS
    }

    fn from_row(row: &Record) -> Result<Self> {
        Ok(Todo {
            id: Some(row.i64("id")?),
            user_id: row.i64("user_id")?,
            title: row.text("title")?,
            done: row.bool("done")?,
            created_at: row.text("created_at")?,
            user: BelongsTo::new(),
            tags: BelongsToMany::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("user_id", self.user_id)
            .set("title", self.title.as_str())
            .set("done", self.done)
            .set("created_at", self.created_at.as_str())
    }
}

impl Todo {
    pub fn user(&mut self, db: &Store) -> Result<Option<&User>> {
        self.user.get_or_load(db, "id", self.user_id)
    }

    pub fn tags(&mut self, db: &Store) -> Result<&[Tag]> {
        self.tags.get_or_load(db, TODO_TAGS, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub id: Option<i64>,
    pub label: String,
    pub created_at: String,
    pub todos: BelongsToMany<Todo>,
}

static TAGS: Table = Table {
    name: "tags",
    columns: &["id", "label", "created_at"],
    joins: &[],
};

impl Entity for Tag {
    fn table() -> &'static Table {
        &TAGS
    }

    fn from_row(row: &Record) -> Result<Self> {
        Ok(Tag {
            id: Some(row.i64("id")?),
            label: row.text("label")?,
            created_at: row.text("created_at")?,
            todos: BelongsToMany::new(),
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("id", self.id)
            .set("label", self.label.as_str())
            .set("created_at", self.created_at.as_str())
    }
}

impl Tag {
    pub fn todos(&mut self, db: &Store) -> Result<&[Todo]> {
        self.todos.get_or_load(db, TAG_TODOS, self.id)
    }
}

/// Todos joined to their owner, for reads that need columns of both tables.
#[derive(Debug, Clone)]
pub struct TodoWithOwner {
    pub title: String,
    pub owner_email: String,
}

static TODOS_WITH_OWNER: Table = Table {
    name: "todos",
    columns: &["title", "email"],
    joins: &["JOIN users ON todos.user_id = users.id"],
};

impl Entity for TodoWithOwner {
    fn table() -> &'static Table {
        &TODOS_WITH_OWNER
    }

    fn from_row(row: &Record) -> Result<Self> {
        Ok(TodoWithOwner {
            title: row.text("title")?,
            owner_email: row.text("email")?,
        })
    }

    fn id(&self) -> Option<i64> {
        None
    }

    fn to_record(&self) -> Record {
        Record::new()
            .set("title", self.title.as_str())
            .set("email", self.owner_email.as_str())
    }
}

pub fn seed_user(db: &Store, name: &str, email: &str) -> User {
    db.create(Record::new().set("name", name).set("email", email))
        .unwrap()
}

pub fn seed_todo(db: &Store, user_id: i64, title: &str) -> Todo {
    db.create(
        Record::new()
            .set("user_id", user_id)
            .set("title", title)
            .set("done", false),
    )
    .unwrap()
}

pub fn seed_tag(db: &Store, label: &str) -> Tag {
    db.create(Record::new().set("label", label)).unwrap()
}

pub fn link(db: &Store, todo_id: i64, tag_id: i64) {
    db.execute(
        "INSERT INTO todo_tags (todo_id, tag_id, created_at) VALUES (?, ?, '2024-01-01 00:00:00')",
        &[todo_id.into(), tag_id.into()],
    )
    .unwrap();
}
