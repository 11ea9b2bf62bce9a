//! Code for creating the user table and fetching users from the master database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash, db::get_timestamp};

/// A newtype wrapper for integer user IDs.
///
/// The user ID also selects the user's data partition, so it must never be
/// mixed up with the IDs of records inside a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the master database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// Create the user table.
///
/// `AUTOINCREMENT` stops the IDs of deleted users from being handed out
/// again, since an ID also names a partition file.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::UserAlreadyExists] if `username` is taken.
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    username: &str,
    password_hash: PasswordHash,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO users (username, password, created_at) VALUES (?1, ?2, ?3)",
        (username, password_hash.as_ref(), created_at.unix_timestamp()),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: username.to_owned(),
        password_hash,
        created_at: created_at.replace_nanosecond(0).unwrap_or(created_at),
    })
}

/// Get the user registered with `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - no user has the name `username` ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, password, created_at FROM users WHERE username = :username")?
        .query_row(&[(":username", username)], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let username = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let created_at = get_timestamp(row, 3)?;

    Ok(User {
        id: UserID::new(raw_id),
        username,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at,
    })
}
