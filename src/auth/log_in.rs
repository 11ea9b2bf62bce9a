//! Logging users in and out.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::cookie::{get_session_id, invalidate_session_cookie, set_session_cookie},
    partition::PartitionStore,
    response::{JsonBody, success, success_message},
    session::{create_session, delete_session},
    user::get_user_by_username,
};

/// The state needed for starting and ending sessions.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a new session lasts.
    pub session_duration: Duration,
    /// The connection to the master database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Used to check that a user's data is available before logging them in.
    pub partitions: PartitionStore,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            session_duration: state.session_duration,
            db_connection: state.db_connection.clone(),
            partitions: state.partitions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SessionState> for Key {
    fn from_ref(state: &SessionState) -> Self {
        state.cookie_key.clone()
    }
}

/// The request body for logging in.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInForm {
    pub username: String,
    pub password: String,
}

/// A route handler for logging in.
///
/// On success a new session is started and its ID is stored in the session
/// cookie.
pub async fn log_in_endpoint(
    State(state): State<SessionState>,
    jar: PrivateCookieJar,
    JsonBody(form): JsonBody<LogInForm>,
) -> Result<Response, Error> {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Err(Error::EmptyCredentials);
    }

    let user = {
        let connection = lock(&state.db_connection)?;

        get_user_by_username(username, &connection).map_err(|error| match error {
            Error::NotFound => Error::UserNotFound,
            error => error,
        })?
    };

    if !state.partitions.exists(user.id) {
        tracing::error!("User {} has no data partition", user.id);
        return Err(Error::PartitionMissing(user.id.as_i64()));
    }

    let is_password_valid = user
        .password_hash
        .verify(&form.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let session = {
        let connection = lock(&state.db_connection)?;

        create_session(
            &user,
            OffsetDateTime::now_utc(),
            state.session_duration,
            &connection,
        )?
    };

    let jar = set_session_cookie(jar, &session);
    let data = json!({
        "id": user.id,
        "username": user.username,
        "expires_at": session.expires_at.unix_timestamp(),
    });

    Ok((jar, success(StatusCode::OK, "Login successful", data)).into_response())
}

/// A route handler for logging out.
///
/// The session is deleted on a best-effort basis and the session cookie is
/// always cleared, so logging out never fails.
pub async fn log_out_endpoint(
    State(state): State<SessionState>,
    jar: PrivateCookieJar,
) -> Response {
    if let Some(session_id) = get_session_id(&jar) {
        let result = lock(&state.db_connection)
            .and_then(|connection| delete_session(&session_id, &connection));

        if let Err(error) = result {
            tracing::warn!("Could not delete session on log out: {error}");
        }
    }

    (
        invalidate_session_cookie(jar),
        success_message("Logout successful"),
    )
        .into_response()
}

fn lock(db_connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use tempfile::TempDir;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash, ValidatedPassword,
        auth::cookie::SESSION_COOKIE,
        db::initialize,
        partition::PartitionStore,
        user::create_user,
    };

    use super::{SessionState, log_in_endpoint, log_out_endpoint};

    /// Test helper macro to assert that two date times are within one second
    /// of each other.
    macro_rules! assert_date_time_close {
        ($left:expr, $right:expr$(,)?) => {
            assert!(
                ($left - $right).abs() < Duration::seconds(2),
                "got date time {:?}, want {:?}",
                $left,
                $right
            );
        };
    }

    fn get_test_state(with_partition: bool) -> (TempDir, SessionState) {
        let directory = tempfile::tempdir().unwrap();
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        let partitions = PartitionStore::new(directory.path());

        let user = create_user(
            "alice",
            PasswordHash::new(ValidatedPassword::new_unchecked("test"), 4)
                .expect("Could not hash password"),
            OffsetDateTime::now_utc(),
            &connection,
        )
        .expect("Could not create test user");

        if with_partition {
            partitions.create(user.id).expect("Could not create partition");
        }

        let state = SessionState {
            cookie_key: Key::generate(),
            session_duration: Duration::hours(24),
            db_connection: Arc::new(Mutex::new(connection)),
            partitions,
        };

        (directory, state)
    }

    fn get_test_server(state: SessionState) -> TestServer {
        let app = Router::new()
            .route("/log_in", post(log_in_endpoint))
            .route("/log_out", post(log_out_endpoint))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let (_directory, state) = get_test_state(true);
        let server = get_test_server(state);

        let response = server
            .post("/log_in")
            .json(&json!({"username": "alice", "password": "test"}))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["username"], "alice");
        let cookie = response.cookie(SESSION_COOKIE);
        assert_date_time_close!(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::hours(24),
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let (_directory, state) = get_test_state(true);
        let server = get_test_server(state);

        let response = server
            .post("/log_in")
            .json(&json!({"username": "alice", "password": "wrongpassword"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "invalid_credentials");
    }

    #[tokio::test]
    async fn log_in_fails_for_unknown_user() {
        let (_directory, state) = get_test_state(true);
        let server = get_test_server(state);

        let response = server
            .post("/log_in")
            .json(&json!({"username": "mallory", "password": "test"}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "user_not_found");
    }

    #[tokio::test]
    async fn log_in_fails_without_partition() {
        let (_directory, state) = get_test_state(false);
        let server = get_test_server(state);

        let response = server
            .post("/log_in")
            .json(&json!({"username": "alice", "password": "test"}))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "storage_failure");
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_fields() {
        let (_directory, state) = get_test_state(true);
        let server = get_test_server(state);

        let response = server
            .post("/log_in")
            .json(&json!({"username": "alice"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "invalid_request");
    }

    #[tokio::test]
    async fn log_out_clears_cookie_and_session() {
        let (_directory, state) = get_test_state(true);
        let db_connection = state.db_connection.clone();
        let mut server = get_test_server(state);
        server.save_cookies();
        server
            .post("/log_in")
            .json(&json!({"username": "alice", "password": "test"}))
            .await
            .assert_status_ok();

        let response = server.post("/log_out").await;

        response.assert_status_ok();
        let cookie = response.cookie(SESSION_COOKIE);
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        let session_count: i64 = db_connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(session_count, 0);
    }

    #[tokio::test]
    async fn log_out_without_session_succeeds() {
        let (_directory, state) = get_test_state(true);
        let server = get_test_server(state);

        let response = server.post("/log_out").await;

        response.assert_status_ok();
    }
}
