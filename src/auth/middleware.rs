//! Authentication middleware that checks the session cookie of every request
//! to a protected route.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::cookie::{get_session_id, invalidate_session_cookie},
    session::validate_session,
};

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The connection to the master database that holds the sessions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid session cookie.
///
/// The user ID is placed into the request and the request is run normally if
/// the session is valid. Otherwise the request is rejected with
/// [Error::NotLoggedIn] or [Error::SessionInvalidOrExpired], and a session
/// cookie that no longer works is cleared.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = get_session_id(&jar) else {
        return Error::NotLoggedIn.into_response();
    };

    let session = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        validate_session(&session_id, OffsetDateTime::now_utc(), &connection)
    };

    match session {
        Ok(session) => {
            request.extensions_mut().insert(session.user_id);
            next.run(request).await
        }
        Err(Error::SessionInvalidOrExpired) => (
            invalidate_session_cookie(jar),
            Error::SessionInvalidOrExpired,
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
