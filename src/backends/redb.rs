//! redb Backend
//!
//! An embedded single-file B-tree store. Each database is a redb table of
//! raw byte keys and values inside one file:
//!
//! ```text
//! test.redb
//!   ├── table "default"   <- opened on connect
//!   └── table "sessions"
//! ```
//!
//! Every primitive runs in its own transaction. Writes commit before the
//! call returns; a failed write is rolled back by dropping the transaction.
//!
//! redb has no expiry, so TTL commands are not supported.

use crate::backends::BackendType;
use crate::config::LocalConfig;
use crate::connection::{Capabilities, NativeBackend};
use crate::error::Error;
use crate::info::{RedbStats, ServerInfo};
use redb::{
    Database, ReadOnlyTable, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
    TableHandle, WriteTransaction,
};
use std::path::PathBuf;
use thiserror::Error as ThisError;
use tracing::debug;

/// Table opened on connect
pub const DEFAULT_TABLE: &str = "default";

type Bin = &'static [u8];

fn table_def(name: &str) -> TableDefinition<'_, Bin, Bin> {
    TableDefinition::new(name)
}

/// Errors raised by the redb backend.
#[derive(Debug, ThisError)]
pub enum RedbError {
    #[error(transparent)]
    Redb(#[from] redb::Error),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("table '{0}' is in use")]
    TableInUse(String),

    #[error("database file {0} does not exist (use -c to create it)")]
    MissingFile(PathBuf),

    #[error("invalid table name '{0}'")]
    InvalidName(String),
}

impl RedbError {
    /// Stable numeric code reported in `NativeError`.
    pub fn code(&self) -> i64 {
        match self {
            RedbError::Redb(_) => 1,
            RedbError::TableNotFound(_) => 2,
            RedbError::TableExists(_) => 3,
            RedbError::TableInUse(_) => 4,
            RedbError::MissingFile(_) => 5,
            RedbError::InvalidName(_) => 6,
        }
    }
}

macro_rules! from_redb {
    ($($ty:ty),*) => {
        $(impl From<$ty> for RedbError {
            fn from(e: $ty) -> Self {
                RedbError::Redb(e.into())
            }
        })*
    };
}

from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError
);

/// Native handle of the redb backend.
pub struct RedbBackend {
    db: Database,
    path: PathBuf,
    current: String,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .field("current", &self.current)
            .finish()
    }
}

impl RedbBackend {
    fn read_table(&self, name: &str) -> Result<ReadOnlyTable<Bin, Bin>, RedbError> {
        let txn = self.db.begin_read()?;
        match txn.open_table(table_def(name)) {
            Ok(table) => Ok(table),
            Err(TableError::TableDoesNotExist(_)) => Err(RedbError::TableNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn table_exists(&self, name: &str) -> Result<bool, RedbError> {
        match self.read_table(name) {
            Ok(_) => Ok(true),
            Err(RedbError::TableNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Runs `f` in a write transaction and commits it.
    fn write<T>(
        &self,
        f: impl FnOnce(&WriteTransaction) -> Result<T, RedbError>,
    ) -> Result<T, RedbError> {
        let txn = self.db.begin_write()?;
        let out = f(&txn)?;
        txn.commit()?;
        Ok(out)
    }
}

impl NativeBackend for RedbBackend {
    type Error = RedbError;
    const TYPE: BackendType = BackendType::Redb;

    fn open(config: &LocalConfig) -> Result<Self, RedbError> {
        let path = config.db_path();
        let db = if path.exists() {
            Database::open(&path)?
        } else if config.create_if_missing {
            Database::create(&path)?
        } else {
            return Err(RedbError::MissingFile(path));
        };

        let backend = Self {
            db,
            path,
            current: DEFAULT_TABLE.to_string(),
        };
        backend.write(|txn| {
            txn.open_table(table_def(DEFAULT_TABLE))?;
            Ok(())
        })?;

        debug!(path = %backend.path.display(), "Opened redb file");
        Ok(backend)
    }

    fn close(self) -> Result<(), RedbError> {
        Ok(())
    }

    fn check_result(command: &str, err: RedbError) -> Error {
        match err {
            RedbError::TableNotFound(name) => Error::DatabaseNotFound(name),
            other => Error::NativeError {
                code: other.code(),
                message: format!("{}: {}", command, other),
            },
        }
    }

    fn capabilities() -> Capabilities {
        Capabilities {
            rename: true,
            ttl: false,
        }
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RedbError> {
        let table = self.read_table(&self.current)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), RedbError> {
        self.write(|txn| {
            let mut table = txn.open_table(table_def(&self.current))?;
            table.insert(key, value)?;
            Ok(())
        })
    }

    fn remove(&mut self, key: &[u8]) -> Result<bool, RedbError> {
        self.write(|txn| {
            let mut table = txn.open_table(table_def(&self.current))?;
            let existed = table.remove(key)?.is_some();
            Ok(existed)
        })
    }

    fn visit_keys(&self, visit: &mut dyn FnMut(&[u8]) -> bool) -> Result<(), RedbError> {
        let table = self.read_table(&self.current)?;
        for entry in table.iter()? {
            let (key, _) = entry?;
            if !visit(key.value()) {
                break;
            }
        }
        Ok(())
    }

    fn range_keys(&self, start: &[u8], end: &[u8], limit: u64) -> Result<Vec<Vec<u8>>, RedbError> {
        let mut keys = Vec::new();
        if limit == 0 || start > end {
            return Ok(keys);
        }

        let table = self.read_table(&self.current)?;
        for entry in table.range(start..=end)? {
            let (key, _) = entry?;
            keys.push(key.value().to_vec());
            if keys.len() as u64 == limit {
                break;
            }
        }
        Ok(keys)
    }

    fn count(&self) -> Result<u64, RedbError> {
        let table = self.read_table(&self.current)?;
        Ok(table.len()?)
    }

    fn clear(&mut self) -> Result<(), RedbError> {
        self.write(|txn| {
            txn.delete_table(table_def(&self.current))?;
            txn.open_table(table_def(&self.current))?;
            Ok(())
        })
    }

    fn current_database(&self) -> &str {
        &self.current
    }

    fn databases(&self) -> Result<Vec<String>, RedbError> {
        let txn = self.db.begin_read()?;
        let mut names: Vec<String> = txn
            .list_tables()?
            .map(|handle| handle.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn create_database(&mut self, name: &str) -> Result<(), RedbError> {
        if name.trim().is_empty() {
            return Err(RedbError::InvalidName(name.to_string()));
        }
        if self.table_exists(name)? {
            return Err(RedbError::TableExists(name.to_string()));
        }
        self.write(|txn| {
            txn.open_table(table_def(name))?;
            Ok(())
        })
    }

    fn remove_database(&mut self, name: &str) -> Result<(), RedbError> {
        if name == self.current {
            return Err(RedbError::TableInUse(name.to_string()));
        }
        let existed = self.write(|txn| Ok(txn.delete_table(table_def(name))?))?;
        if existed {
            Ok(())
        } else {
            Err(RedbError::TableNotFound(name.to_string()))
        }
    }

    fn select_database(&mut self, name: &str) -> Result<(), RedbError> {
        if !self.table_exists(name)? {
            return Err(RedbError::TableNotFound(name.to_string()));
        }
        self.current = name.to_string();
        Ok(())
    }

    fn stats_text(&self) -> Result<String, RedbError> {
        let file_size = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .unwrap_or(0);

        let info = ServerInfo::Redb(RedbStats {
            file_path: self.path.display().to_string(),
            file_size,
            databases: self.databases()?.len() as u64,
            current_database: self.current.clone(),
            keys: self.count()?,
        });
        Ok(info.to_text())
    }
}
