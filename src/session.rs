//! Server-side sessions stored in the master database.
//!
//! A session is created on log in and is valid for a fixed duration. Expiry
//! is checked whenever a session is used; expired sessions that are never
//! used again are removed by [cleanup_sessions_periodically].

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, db::get_timestamp, user::User, user::UserID};

/// How long a session lasts after log in.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::hours(24);

/// The opaque identifier the client presents to use a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new, random session ID.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap a session ID received from a client.
    ///
    /// The ID is not checked, look it up with [validate_session].
    pub fn new_unchecked(raw_session_id: &str) -> Self {
        Self(raw_session_id.to_owned())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A logged in user's session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The ID the client stores in its session cookie.
    pub id: SessionId,
    /// The user the session belongs to.
    pub user_id: UserID,
    /// The name of the user the session belongs to.
    pub username: String,
    /// The session is invalid from this time onwards.
    pub expires_at: OffsetDateTime,
    /// When the user logged in.
    pub created_at: OffsetDateTime,
}

impl Session {
    /// Whether the session has expired at `now`.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Create the session table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            username TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);",
    )
}

/// Start a new session for `user` that lasts for `duration` from `now`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the session could not be stored.
pub fn create_session(
    user: &User,
    now: OffsetDateTime,
    duration: Duration,
    connection: &Connection,
) -> Result<Session, Error> {
    let now = now.replace_nanosecond(0).unwrap_or(now);
    let session = Session {
        id: SessionId::new_random(),
        user_id: user.id,
        username: user.username.clone(),
        expires_at: now + duration,
        created_at: now,
    };

    connection.execute(
        "INSERT INTO sessions (session_id, user_id, username, expires_at, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            session.id.as_ref(),
            session.user_id.as_i64(),
            &session.username,
            session.expires_at.unix_timestamp(),
            session.created_at.unix_timestamp(),
        ),
    )?;

    Ok(session)
}

/// Look up the session `session_id` and check that it has not expired.
///
/// An expired session is deleted when it is found.
///
/// # Errors
///
/// Returns [Error::SessionInvalidOrExpired] if there is no such session or it
/// has expired, or [Error::SqlError] if the lookup failed.
pub fn validate_session(
    session_id: &SessionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Session, Error> {
    let session = connection
        .prepare(
            "SELECT session_id, user_id, username, expires_at, created_at
            FROM sessions WHERE session_id = :session_id",
        )?
        .query_row(&[(":session_id", session_id.as_ref())], map_row)
        .map_err(Error::from)
        .map_err(|error| match error {
            Error::NotFound => Error::SessionInvalidOrExpired,
            error => error,
        })?;

    if session.is_expired(now) {
        if let Err(error) = delete_session(session_id, connection) {
            tracing::warn!("could not delete expired session: {error}");
        }

        return Err(Error::SessionInvalidOrExpired);
    }

    Ok(session)
}

/// Delete the session `session_id`, e.g. when the user logs out.
///
/// Deleting a session that does not exist is not an error.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the delete failed.
pub fn delete_session(session_id: &SessionId, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM sessions WHERE session_id = ?1",
        [session_id.as_ref()],
    )?;

    Ok(())
}

/// Delete every session that has expired at `now`.
///
/// Returns the number of sessions deleted.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the delete failed.
pub fn cleanup_expired_sessions(
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            [now.unix_timestamp()],
        )
        .map_err(Error::from)
}

/// Remove expired sessions every `period` until the task is dropped.
///
/// Failures are logged and retried on the next tick.
pub async fn cleanup_sessions_periodically(
    db_connection: Arc<Mutex<Connection>>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let connection = match db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                continue;
            }
        };

        match cleanup_expired_sessions(OffsetDateTime::now_utc(), &connection) {
            Ok(0) => {}
            Ok(count) => tracing::info!("Removed {count} expired sessions"),
            Err(error) => tracing::warn!("Could not remove expired sessions: {error}"),
        }
    }
}

fn map_row(row: &Row) -> Result<Session, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let username = row.get(2)?;
    let expires_at = get_timestamp(row, 3)?;
    let created_at = get_timestamp(row, 4)?;

    Ok(Session {
        id: SessionId(raw_id),
        user_id: UserID::new(raw_user_id),
        username,
        expires_at,
        created_at,
    })
}

#[cfg(test)]
mod session_tests {
    use rusqlite::Connection;
    use time::{Duration, macros::datetime};

    use crate::{
        Error, PasswordHash,
        db::initialize,
        user::{User, create_user},
    };

    use super::{
        DEFAULT_SESSION_DURATION, SessionId, cleanup_expired_sessions, create_session,
        delete_session, validate_session,
    };

    fn get_test_connection_and_user() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "alice",
            PasswordHash::new_unchecked("hunter2"),
            datetime!(2025-01-01 00:00 UTC),
            &connection,
        )
        .expect("Could not create test user");

        (connection, user)
    }

    fn count_sessions(connection: &Connection) -> i64 {
        connection
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new_random(), SessionId::new_random());
    }

    #[test]
    fn created_session_validates_before_expiry() {
        let (connection, user) = get_test_connection_and_user();
        let now = datetime!(2025-06-01 12:00 UTC);
        let session = create_session(&user, now, DEFAULT_SESSION_DURATION, &connection).unwrap();

        let got = validate_session(&session.id, now + Duration::hours(23), &connection);

        assert_eq!(got, Ok(session.clone()));
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.username, "alice");
        assert_eq!(session.expires_at, datetime!(2025-06-02 12:00 UTC));
    }

    #[test]
    fn expired_session_is_rejected_and_deleted() {
        let (connection, user) = get_test_connection_and_user();
        let now = datetime!(2025-06-01 12:00 UTC);
        let session = create_session(&user, now, DEFAULT_SESSION_DURATION, &connection).unwrap();

        let got = validate_session(&session.id, now + Duration::hours(24), &connection);

        assert_eq!(got, Err(Error::SessionInvalidOrExpired));
        assert_eq!(count_sessions(&connection), 0);
    }

    #[test]
    fn unknown_session_is_rejected() {
        let (connection, _) = get_test_connection_and_user();

        let got = validate_session(
            &SessionId::new_unchecked("not-a-session"),
            datetime!(2025-06-01 12:00 UTC),
            &connection,
        );

        assert_eq!(got, Err(Error::SessionInvalidOrExpired));
    }

    #[test]
    fn deleted_session_is_rejected() {
        let (connection, user) = get_test_connection_and_user();
        let now = datetime!(2025-06-01 12:00 UTC);
        let session = create_session(&user, now, DEFAULT_SESSION_DURATION, &connection).unwrap();

        delete_session(&session.id, &connection).unwrap();

        assert_eq!(
            validate_session(&session.id, now, &connection),
            Err(Error::SessionInvalidOrExpired)
        );
    }

    #[test]
    fn cleanup_only_removes_expired_sessions() {
        let (connection, user) = get_test_connection_and_user();
        let now = datetime!(2025-06-01 12:00 UTC);
        create_session(&user, now - Duration::days(2), DEFAULT_SESSION_DURATION, &connection)
            .unwrap();
        create_session(&user, now - Duration::days(3), DEFAULT_SESSION_DURATION, &connection)
            .unwrap();
        let live = create_session(&user, now, DEFAULT_SESSION_DURATION, &connection).unwrap();

        let removed = cleanup_expired_sessions(now, &connection);

        assert_eq!(removed, Ok(2));
        assert_eq!(count_sessions(&connection), 1);
        assert!(validate_session(&live.id, now, &connection).is_ok());
    }
}
