//! Where the server keeps its data on disk.

use std::path::{Path, PathBuf};

use crate::partition::PartitionStore;

/// The file name of the master database inside the data directory.
pub const MASTER_DB_FILE: &str = "master.db";
/// The directory holding the user partitions inside the data directory.
pub const PARTITION_DIR: &str = "usersdata";

/// The layout of the data directory.
///
/// ```text
/// <data_dir>/
///   master.db
///   usersdata/
///     user_1.db
///     user_2.db
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    data_dir: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The root of the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The path of the master database holding users and sessions.
    pub fn master_db_path(&self) -> PathBuf {
        self.data_dir.join(MASTER_DB_FILE)
    }

    /// The directory holding the user partitions.
    pub fn partition_dir(&self) -> PathBuf {
        self.data_dir.join(PARTITION_DIR)
    }

    /// A [PartitionStore] for the partition directory.
    pub fn partitions(&self) -> PartitionStore {
        PartitionStore::new(self.partition_dir())
    }
}
