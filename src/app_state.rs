//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, PasswordHash, db::initialize, partition::PartitionStore,
    session::DEFAULT_SESSION_DURATION, timezone::get_timezone,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// How long a session lasts after log in.
    pub session_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The bcrypt cost used when hashing new passwords.
    pub password_hash_cost: u32,

    /// The connection to the master database holding users and sessions.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The per-user databases holding categories and transactions.
    pub partitions: PartitionStore,
}

impl AppState {
    /// Create a new [AppState] with a connection to the master database.
    ///
    /// This function will initialize the master database by adding the user
    /// and session tables. `local_timezone` should be a valid, canonical
    /// timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized or the
    /// timezone is not known.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        partitions: PartitionStore,
    ) -> Result<Self, Error> {
        get_timezone(local_timezone)?;
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            session_duration: DEFAULT_SESSION_DURATION,
            local_timezone: local_timezone.to_owned(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
            db_connection: Arc::new(Mutex::new(db_connection)),
            partitions,
        })
    }

    /// Use `session_duration` for new sessions.
    pub fn with_session_duration(mut self, session_duration: Duration) -> Self {
        self.session_duration = session_duration;
        self
    }

    /// Use `cost` when hashing new passwords.
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;
    use tempfile::tempdir;

    use crate::{Error, partition::PartitionStore};

    use super::{AppState, create_cookie_key};

    #[test]
    fn new_initializes_master_database() {
        let directory = tempdir().unwrap();
        let connection = Connection::open_in_memory().unwrap();

        let state = AppState::new(
            connection,
            "secret",
            "Etc/UTC",
            PartitionStore::new(directory.path()),
        )
        .expect("Could not create app state");

        let table_count: i64 = state
            .db_connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'sessions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let directory = tempdir().unwrap();
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(
            connection,
            "secret",
            "Atlantis/Central",
            PartitionStore::new(directory.path()),
        );

        assert_eq!(
            result.err(),
            Some(Error::InvalidTimezone("Atlantis/Central".to_owned()))
        );
    }

    #[test]
    fn cookie_key_is_deterministic() {
        assert_eq!(
            create_cookie_key("secret").master(),
            create_cookie_key("secret").master()
        );
        assert_ne!(
            create_cookie_key("secret").master(),
            create_cookie_key("other").master()
        );
    }
}
