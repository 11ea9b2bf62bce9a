//! Per-user data partitions.
//!
//! Every user's categories and transactions live in their own SQLite file.
//! A partition is created when the user registers and is opened for the
//! duration of a single request.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rusqlite::{Connection, OpenFlags, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, category::create_category_table, transaction::create_transaction_table, user::UserID,
};

/// Creates, opens and removes the partition files in one directory.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    directory: PathBuf,
}

impl PartitionStore {
    /// Create a store that keeps partition files in `directory`.
    ///
    /// The directory is created on demand when the first partition is created.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The path of the partition file for `user_id`.
    pub fn path(&self, user_id: UserID) -> PathBuf {
        self.directory.join(format!("user_{user_id}.db"))
    }

    /// Whether the partition for `user_id` exists.
    pub fn exists(&self, user_id: UserID) -> bool {
        self.path(user_id).is_file()
    }

    /// Create an empty partition for `user_id`.
    ///
    /// A file left behind for the same ID, e.g. by a crash during
    /// registration, is replaced.
    ///
    /// # Errors
    ///
    /// Returns [Error::PartitionIo] if the file could not be created, or
    /// [Error::SqlError] if its tables could not be created. Nothing is left
    /// on disk in either case.
    pub fn create(&self, user_id: UserID) -> Result<(), Error> {
        fs::create_dir_all(&self.directory).map_err(|error| io_error(&self.directory, error))?;

        let path = self.path(user_id);

        if path.exists() {
            tracing::warn!("Replacing stale partition file {}", path.display());
            fs::remove_file(&path).map_err(|error| io_error(&path, error))?;
        }

        let result = Connection::open(&path)
            .map_err(Error::from)
            .and_then(|connection| initialize_partition(&connection));

        if result.is_err() {
            self.remove_or_log(user_id);
        }

        result
    }

    /// Open the partition for `user_id`.
    ///
    /// The connection should be dropped as soon as the current operation is
    /// done with it.
    ///
    /// # Errors
    ///
    /// Returns [Error::PartitionMissing] if the partition has not been
    /// created, or [Error::SqlError] if it could not be opened.
    pub fn open(&self, user_id: UserID) -> Result<Connection, Error> {
        let path = self.path(user_id);

        if !path.is_file() {
            tracing::error!("Partition file {} does not exist", path.display());
            return Err(Error::PartitionMissing(user_id.as_i64()));
        }

        let connection = Connection::open_with_flags(
            &path,
            OpenFlags::default().difference(OpenFlags::SQLITE_OPEN_CREATE),
        )?;
        connection.pragma_update(None, "foreign_keys", "ON")?;

        Ok(connection)
    }

    /// Delete the partition for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [Error::PartitionIo] if the file exists but could not be removed.
    pub fn remove(&self, user_id: UserID) -> Result<(), Error> {
        let path = self.path(user_id);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&path, error)),
        }
    }

    /// Delete the partition for `user_id`, logging instead of returning any error.
    pub(crate) fn remove_or_log(&self, user_id: UserID) {
        if let Err(error) = self.remove(user_id) {
            tracing::error!("Could not remove partition for user {user_id}: {error}");
        }
    }
}

/// Create the tables of a user partition.
///
/// # Errors
///
/// Returns an error if a table could not be created, in which case none of
/// the tables are created.
pub fn initialize_partition(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn io_error(path: &Path, error: io::Error) -> Error {
    tracing::error!("File system error for {}: {error}", path.display());

    Error::PartitionIo(error.to_string())
}

#[cfg(test)]
mod partition_store_tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::{Error, user::UserID};

    use super::PartitionStore;

    fn get_test_store() -> (TempDir, PartitionStore) {
        let directory = tempfile::tempdir().expect("Could not create temporary directory");
        let store = PartitionStore::new(directory.path().join("usersdata"));

        (directory, store)
    }

    #[test]
    fn create_then_open_succeeds() {
        let (_directory, store) = get_test_store();
        let user_id = UserID::new(7);

        store.create(user_id).expect("Could not create partition");

        assert!(store.exists(user_id));
        assert!(store.path(user_id).ends_with("usersdata/user_7.db"));
        let connection = store.open(user_id).expect("Could not open partition");
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('categories', 'transactions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }

    #[test]
    fn open_fails_for_missing_partition() {
        let (_directory, store) = get_test_store();

        let result = store.open(UserID::new(1));

        assert!(matches!(result, Err(Error::PartitionMissing(1))));
        assert!(!store.exists(UserID::new(1)));
    }

    #[test]
    fn create_replaces_stale_file() {
        let (_directory, store) = get_test_store();
        let user_id = UserID::new(3);
        fs::create_dir_all(store.path(user_id).parent().unwrap()).unwrap();
        fs::write(store.path(user_id), b"not a database").unwrap();

        store.create(user_id).expect("Could not replace stale partition");

        assert!(store.open(user_id).is_ok());
    }

    #[test]
    fn remove_deletes_partition() {
        let (_directory, store) = get_test_store();
        let user_id = UserID::new(2);
        store.create(user_id).unwrap();

        store.remove(user_id).expect("Could not remove partition");

        assert!(!store.exists(user_id));
        assert_eq!(store.remove(user_id), Ok(()));
    }
}
