//! Memory Backend
//!
//! Keeps every database as a sharded [`StorageEngine`] inside the native
//! handle. Data lives as long as the handle: disconnecting discards it.
//!
//! ```text
//! MemoryBackend
//!   ├── "default" ──> StorageEngine (64 shards)
//!   └── "sessions" ──> StorageEngine (64 shards)
//!         ▲
//!         └── current
//! ```
//!
//! Supports per-key TTL. Expired keys are dropped lazily; `PURGE` sweeps
//! the current database at once.

use crate::backends::BackendType;
use crate::commands::CommandHolder;
use crate::config::LocalConfig;
use crate::connection::{Capabilities, Connection, NativeBackend};
use crate::error::{Error, Result};
use crate::info::{MemoryStats, ServerInfo};
use crate::storage::StorageEngine;
use crate::value::Value;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::debug;

/// Errors raised by the memory backend.
#[derive(Debug, ThisError)]
pub enum MemoryError {
    #[error("database '{0}' does not exist")]
    DatabaseNotFound(String),

    #[error("database '{0}' already exists")]
    DatabaseExists(String),

    #[error("database '{0}' is in use")]
    DatabaseInUse(String),

    #[error("invalid database name '{0}'")]
    InvalidName(String),
}

impl MemoryError {
    /// Stable numeric code reported in `NativeError`.
    pub fn code(&self) -> i64 {
        match self {
            MemoryError::DatabaseNotFound(_) => 1,
            MemoryError::DatabaseExists(_) => 2,
            MemoryError::DatabaseInUse(_) => 3,
            MemoryError::InvalidName(_) => 4,
        }
    }
}

/// Native handle of the memory backend.
#[derive(Debug)]
pub struct MemoryBackend {
    databases: BTreeMap<String, StorageEngine>,
    current: String,
}

impl MemoryBackend {
    fn engine(&self) -> &StorageEngine {
        // The current database can only be removed after switching away
        &self.databases[&self.current]
    }

    /// Drops expired keys of the current database.
    pub fn purge(&self) -> u64 {
        let cleaned = self.engine().cleanup_expired();
        debug!(db = %self.current, cleaned, "Purged expired keys");
        cleaned
    }
}

impl NativeBackend for MemoryBackend {
    type Error = MemoryError;
    const TYPE: BackendType = BackendType::Memory;

    fn open(config: &LocalConfig) -> std::result::Result<Self, MemoryError> {
        let name = config.db_name.trim();
        if name.is_empty() {
            return Err(MemoryError::InvalidName(config.db_name.clone()));
        }

        let mut databases = BTreeMap::new();
        databases.insert(name.to_string(), StorageEngine::new());
        Ok(Self {
            databases,
            current: name.to_string(),
        })
    }

    fn close(self) -> std::result::Result<(), MemoryError> {
        Ok(())
    }

    fn check_result(command: &str, err: MemoryError) -> Error {
        match err {
            MemoryError::DatabaseNotFound(name) => Error::DatabaseNotFound(name),
            other => Error::NativeError {
                code: other.code(),
                message: format!("{}: {}", command, other),
            },
        }
    }

    fn capabilities() -> Capabilities {
        Capabilities {
            rename: true,
            ttl: true,
        }
    }

    fn extra_commands() -> Vec<CommandHolder<Connection<Self>>> {
        vec![CommandHolder::new(
            "PURGE",
            "",
            "Drop expired keys of the current database",
            Some("0.1.0"),
            None,
            0,
            0,
            purge,
        )]
    }

    fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, MemoryError> {
        Ok(self.engine().get(key).map(|v| v.to_vec()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> std::result::Result<(), MemoryError> {
        self.engine()
            .set(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> std::result::Result<bool, MemoryError> {
        Ok(self.engine().delete(key))
    }

    fn visit_keys(
        &self,
        visit: &mut dyn FnMut(&[u8]) -> bool,
    ) -> std::result::Result<(), MemoryError> {
        for key in self.engine().sorted_keys() {
            if !visit(&key) {
                break;
            }
        }
        Ok(())
    }

    fn count(&self) -> std::result::Result<u64, MemoryError> {
        self.engine().cleanup_expired();
        Ok(self.engine().len())
    }

    fn clear(&mut self) -> std::result::Result<(), MemoryError> {
        self.engine().flush();
        Ok(())
    }

    fn current_database(&self) -> &str {
        &self.current
    }

    fn databases(&self) -> std::result::Result<Vec<String>, MemoryError> {
        Ok(self.databases.keys().cloned().collect())
    }

    fn create_database(&mut self, name: &str) -> std::result::Result<(), MemoryError> {
        if name.trim().is_empty() {
            return Err(MemoryError::InvalidName(name.to_string()));
        }
        if self.databases.contains_key(name) {
            return Err(MemoryError::DatabaseExists(name.to_string()));
        }
        self.databases.insert(name.to_string(), StorageEngine::new());
        Ok(())
    }

    fn remove_database(&mut self, name: &str) -> std::result::Result<(), MemoryError> {
        if name == self.current {
            return Err(MemoryError::DatabaseInUse(name.to_string()));
        }
        self.databases
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MemoryError::DatabaseNotFound(name.to_string()))
    }

    fn select_database(&mut self, name: &str) -> std::result::Result<(), MemoryError> {
        if !self.databases.contains_key(name) {
            return Err(MemoryError::DatabaseNotFound(name.to_string()));
        }
        self.current = name.to_string();
        Ok(())
    }

    fn stats_text(&self) -> std::result::Result<String, MemoryError> {
        let stats = self.engine().stats();

        let info = ServerInfo::Memory(MemoryStats {
            databases: self.databases.len() as u64,
            current_database: self.current.clone(),
            keys: stats.live_keys,
            get_ops: stats.get_ops,
            set_ops: stats.set_ops,
            del_ops: stats.del_ops,
            expired_keys: stats.expired,
            used_memory: stats.used_memory,
        });
        Ok(info.to_text())
    }

    fn expire(&mut self, key: &[u8], ttl: Duration) -> std::result::Result<bool, MemoryError> {
        Ok(self.engine().expire(key, ttl))
    }

    fn ttl(&self, key: &[u8]) -> std::result::Result<i64, MemoryError> {
        Ok(self.engine().ttl(key).unwrap_or(-2))
    }
}

/// PURGE
fn purge(conn: &mut Connection<MemoryBackend>, _args: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
    let cleaned = conn.native()?.purge();
    out.push(Value::Integer(cleaned as i64));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::InterruptFlag;
    use crate::value::{Key, NDbKValue};

    fn connected() -> Connection<MemoryBackend> {
        let mut conn = Connection::new(LocalConfig::new("default"), InterruptFlag::new());
        conn.connect().unwrap();
        conn
    }

    #[test]
    fn test_round_trip_every_value_kind() {
        let mut conn = connected();
        let values = vec![
            Value::Null,
            Value::Boolean(true),
            Value::Integer(-7),
            Value::Double(2.5),
            Value::string("hello world"),
            Value::bytes(vec![0u8, 0xff, 0x10]),
            Value::Array(vec![Value::Integer(1), Value::string("x")]),
            Value::set(vec![Value::string("a"), Value::string("b")]),
            Value::ZSet(vec![(Value::string("m"), 1.5)]),
            Value::Hash(vec![(Value::string("f"), Value::Integer(2))]),
            Value::json("{\"a\":1}").unwrap(),
            Value::Graph,
            Value::SearchIndex,
            Value::SearchTerm,
        ];

        for (i, value) in values.into_iter().enumerate() {
            let key = format!("k{}", i);
            conn.set(NDbKValue::new(key.as_str(), value.clone())).unwrap();
            assert_eq!(conn.get(&Key::from(key)).unwrap().value, value);
        }
    }

    #[test]
    fn test_database_lifecycle() {
        let mut conn = connected();
        conn.set(NDbKValue::new("a", Value::Null)).unwrap();

        conn.create_db("second").unwrap();
        assert!(matches!(
            conn.create_db("second"),
            Err(Error::NativeError { code: 2, .. })
        ));

        let info = conn.select_db("second").unwrap();
        assert_eq!(info.name, "second");
        assert_eq!(info.size, 0);

        assert!(matches!(
            conn.remove_db("second"),
            Err(Error::NativeError { code: 3, .. })
        ));

        conn.select_db("default").unwrap();
        assert_eq!(conn.db_size().unwrap(), 1);
        conn.remove_db("second").unwrap();
        assert_eq!(conn.databases().unwrap(), vec!["default".to_string()]);
        assert_eq!(
            conn.remove_db("second"),
            Err(Error::DatabaseNotFound("second".to_string()))
        );
    }

    #[test]
    fn test_expiry_and_purge() {
        let mut conn = connected();
        conn.set(NDbKValue::new("short", Value::Integer(1))).unwrap();
        conn.set(NDbKValue::new("long", Value::Integer(2))).unwrap();

        assert!(conn.native_mut().unwrap().expire(b"short", Duration::ZERO).unwrap());
        assert_eq!(conn.native().unwrap().purge(), 1);
        assert_eq!(conn.db_size().unwrap(), 1);
        assert_eq!(conn.ttl(&Key::from("short")).unwrap(), -2);
        assert_eq!(conn.ttl(&Key::from("long")).unwrap(), -1);
    }

    #[test]
    fn test_server_info() {
        let mut conn = connected();
        conn.set(NDbKValue::new("a", Value::string("v"))).unwrap();
        conn.get(&Key::from("a")).unwrap();

        match conn.server_info().unwrap() {
            ServerInfo::Memory(stats) => {
                assert_eq!(stats.databases, 1);
                assert_eq!(stats.current_database, "default");
                assert_eq!(stats.keys, 1);
                assert_eq!(stats.set_ops, 1);
                assert_eq!(stats.get_ops, 1);
                assert!(stats.used_memory > 0);
            }
            other => panic!("unexpected info: {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_discards_data() {
        let mut conn = connected();
        conn.set(NDbKValue::new("a", Value::Null)).unwrap();
        conn.disconnect().unwrap();
        conn.connect().unwrap();
        assert_eq!(conn.db_size().unwrap(), 0);
    }

    #[test]
    fn test_empty_name_fails_to_connect() {
        let mut conn: Connection<MemoryBackend> =
            Connection::new(LocalConfig::new(" "), InterruptFlag::new());
        assert!(matches!(conn.connect(), Err(Error::ConnectionError(_))));
    }
}
