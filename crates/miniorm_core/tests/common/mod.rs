#![allow(dead_code)]

use miniorm_core::{
    ConnectionProvider, ContractDeclaration, Entity, EntityDeclaration, FieldDeclaration,
    RepositoryContract, RepositoryProxy, SqliteConnectionProvider,
};
use std::sync::Arc;

pub const SCHEMA_SQL: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    email TEXT,
    age INTEGER NOT NULL,
    rating REAL,
    active INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    score INTEGER NOT NULL
);
CREATE TABLE tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL
);";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub user_name: String,
    pub email: Option<String>,
    pub age: i32,
    pub rating: Option<f64>,
    pub active: bool,
    pub temporary_password: Option<String>,
}

impl User {
    pub fn new(user_name: &str, email: &str, age: i32) -> Self {
        Self {
            user_name: user_name.to_string(),
            email: Some(email.to_string()),
            age,
            ..Self::default()
        }
    }
}

impl Entity for User {
    fn declare() -> EntityDeclaration<Self> {
        EntityDeclaration::new()
            .mapped_to("users")
            .field(FieldDeclaration::new("id", |u: &User| &u.id, |u: &mut User| &mut u.id).id())
            .field(
                FieldDeclaration::new(
                    "user_name",
                    |u: &User| &u.user_name,
                    |u: &mut User| &mut u.user_name,
                )
                .column("username"),
            )
            .field(FieldDeclaration::new(
                "email",
                |u: &User| &u.email,
                |u: &mut User| &mut u.email,
            ))
            .field(FieldDeclaration::new(
                "age",
                |u: &User| &u.age,
                |u: &mut User| &mut u.age,
            ))
            .field(FieldDeclaration::new(
                "rating",
                |u: &User| &u.rating,
                |u: &mut User| &mut u.rating,
            ))
            .field(FieldDeclaration::new(
                "active",
                |u: &User| &u.active,
                |u: &mut User| &mut u.active,
            ))
            .field(
                FieldDeclaration::new(
                    "temporary_password",
                    |u: &User| &u.temporary_password,
                    |u: &mut User| &mut u.temporary_password,
                )
                .transient(),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub score: i32,
}

impl Entity for Player {
    fn declare() -> EntityDeclaration<Self> {
        EntityDeclaration::new()
            .mapped()
            .field(
                FieldDeclaration::new("id", |p: &Player| &p.id, |p: &mut Player| &mut p.id).id(),
            )
            .field(FieldDeclaration::new(
                "name",
                |p: &Player| &p.name,
                |p: &mut Player| &mut p.name,
            ))
            .field(FieldDeclaration::new(
                "score",
                |p: &Player| &p.score,
                |p: &mut Player| &mut p.score,
            ))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub id: Option<i32>,
    pub label: String,
}

impl Entity for Tag {
    fn declare() -> EntityDeclaration<Self> {
        EntityDeclaration::new()
            .mapped()
            .field(FieldDeclaration::new("id", |t: &Tag| &t.id, |t: &mut Tag| &mut t.id).id())
            .field(FieldDeclaration::new(
                "label",
                |t: &Tag| &t.label,
                |t: &mut Tag| &mut t.label,
            ))
    }
}

pub struct UserRepository {
    proxy: RepositoryProxy<User, i64>,
}

impl RepositoryContract for UserRepository {
    type Entity = User;
    type Id = i64;

    fn declaration() -> ContractDeclaration {
        ContractDeclaration::capability("UserRepository")
            .extends_crud()
            .operation("findByUserName")
    }

    fn bind(proxy: RepositoryProxy<User, i64>) -> Self {
        Self { proxy }
    }

    fn proxy(&self) -> &RepositoryProxy<User, i64> {
        &self.proxy
    }
}

/// Fresh in-memory provider with the test schema applied.
pub fn memory_provider() -> Arc<SqliteConnectionProvider> {
    let provider = SqliteConnectionProvider::in_memory().unwrap();
    apply_schema(&provider);
    Arc::new(provider)
}

pub fn apply_schema(provider: &dyn ConnectionProvider) {
    provider.acquire().unwrap().execute_batch(SCHEMA_SQL).unwrap();
}
