//! Registering new users.
//!
//! A user is only registered once both their row in the master database and
//! their data partition exist.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::OffsetDateTime;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    partition::PartitionStore,
    response::{JsonBody, success},
    user::{User, create_user},
};

/// The state needed for registering users.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The connection to the master database.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where user partitions are created.
    pub partitions: PartitionStore,
    /// The bcrypt cost for new password hashes.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            partitions: state.partitions.clone(),
            password_hash_cost: state.password_hash_cost,
        }
    }
}

/// The request body for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// Insert a user and create their partition as a single step.
///
/// If anything fails, neither the user nor the partition is left behind.
///
/// # Errors
///
/// Returns:
/// - [Error::UserAlreadyExists] if `username` is taken.
/// - [Error::PartitionIo] or [Error::SqlError] if the user could not be stored.
pub fn register_user(
    username: &str,
    password_hash: PasswordHash,
    now: OffsetDateTime,
    connection: &Connection,
    partitions: &PartitionStore,
) -> Result<User, Error> {
    let transaction = connection.unchecked_transaction()?;

    let user = create_user(username, password_hash, now, &transaction)?;
    partitions.create(user.id)?;

    if let Err(error) = transaction.commit() {
        partitions.remove_or_log(user.id);
        return Err(error.into());
    }

    Ok(user)
}

/// A route handler for registering a new user.
///
/// The password is checked and hashed before the database is locked.
pub async fn register_user_endpoint(
    State(state): State<RegistrationState>,
    JsonBody(form): JsonBody<RegisterForm>,
) -> Result<Response, Error> {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Err(Error::EmptyCredentials);
    }

    let password = ValidatedPassword::new(&form.password, username)?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        register_user(
            username,
            password_hash,
            OffsetDateTime::now_utc(),
            &connection,
            &state.partitions,
        )?
    };

    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok(success(
        StatusCode::CREATED,
        "Registration successful",
        json!({ "id": user.id, "username": user.username }),
    ))
}
