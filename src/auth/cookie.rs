//! Defines functions for storing the session ID in an encrypted cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::session::{Session, SessionId};

/// The name of the cookie holding the session ID.
pub(crate) const SESSION_COOKIE: &str = "session_id";

/// Add a cookie for `session` to the cookie jar that expires with the session.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(jar: PrivateCookieJar, session: &Session) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, session.id.as_ref().to_owned()))
            .expires(session.expires_at)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the session ID from the cookie jar, if the cookie is present and
/// could be decrypted.
pub(crate) fn get_session_id(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| SessionId::new_unchecked(cookie.value()))
}
