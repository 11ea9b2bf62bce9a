//! Set up for the master database and helpers shared by the table modules.
//!
//! Timestamps are stored as whole seconds since the Unix epoch so that time
//! windows can be queried with plain integer comparisons.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior, types::Type};
use time::OffsetDateTime;

use crate::{session::create_session_table, user::create_user_table};

/// Create the tables for the master database, which holds the accounts and
/// sessions of all users.
///
/// # Errors
///
/// Returns an error if a table could not be created, in which case none of
/// the tables are created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_session_table(&transaction)?;

    transaction.commit()
}

/// Read a Unix timestamp column as a date-time in UTC.
pub(crate) fn get_timestamp(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let seconds: i64 = row.get(index)?;

    OffsetDateTime::from_unix_timestamp(seconds).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}
