//! Tally is a bookkeeping service for recording incomes and expenses.
//!
//! This library provides a JSON REST API. Every user's categories and
//! transactions are kept in their own SQLite database, while users and their
//! sessions live in a shared master database.
//!
//! Money is always handled as a whole number of cents. Users enter positive
//! amounts and the sign is decided by the transaction type.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod amount;
mod app_state;
mod auth;
mod category;
mod config;
mod db;
mod endpoints;
mod error;
mod logging;
mod partition;
mod password;
mod patch;
mod response;
mod routing;
mod session;
mod stats;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use amount::{Amount, cents_to_display_text, clean_amount_text, parse_to_cents};
pub use app_state::{AppState, create_cookie_key};
pub use config::StorageLayout;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use partition::PartitionStore;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use session::{DEFAULT_SESSION_DURATION, cleanup_sessions_periodically};
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the Ctrl+C signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
