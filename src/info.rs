//! Server and Database Descriptors
//!
//! Both are immutable snapshots tagged with the backend they came from.
//! They are plain owned data, so handing a clone to another task never
//! shares state with the driver.
//!
//! Backends report statistics as a `key:value` text blob:
//!
//! ```text
//! # Server
//! backend:memory
//! databases:2
//! # Stats
//! keys:10
//! ```
//!
//! `ServerInfo::from_text` parses that blob into the typed per-backend
//! struct, `ServerInfo::to_text` renders it back.

use crate::backends::BackendType;
use crate::error::{Error, Result};
use crate::value::NDbKValue;
use std::fmt::Write;

/// Metadata about one database of a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBaseInfo {
    pub backend: BackendType,
    pub name: String,
    /// True for the database the connection currently works on
    pub is_default: bool,
    /// Number of items
    pub size: u64,
    /// Optional key listing
    pub keys: Vec<NDbKValue>,
}

impl DataBaseInfo {
    pub fn new(backend: BackendType, name: impl Into<String>, is_default: bool, size: u64) -> Self {
        Self {
            backend,
            name: name.into(),
            is_default,
            size,
            keys: Vec::new(),
        }
    }
}

/// Statistics of the in-memory backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub databases: u64,
    pub current_database: String,
    pub keys: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    pub expired_keys: u64,
    pub used_memory: u64,
}

/// Statistics of the redb backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedbStats {
    pub file_path: String,
    pub file_size: u64,
    pub databases: u64,
    pub current_database: String,
    pub keys: u64,
}

/// Backend-tagged server statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerInfo {
    Memory(MemoryStats),
    Redb(RedbStats),
}

impl ServerInfo {
    pub fn backend(&self) -> BackendType {
        match self {
            ServerInfo::Memory(_) => BackendType::Memory,
            ServerInfo::Redb(_) => BackendType::Redb,
        }
    }

    /// Parses a backend stats blob.
    ///
    /// Unknown fields are ignored and missing ones keep their defaults; a
    /// numeric field that does not parse is an error.
    pub fn from_text(backend: BackendType, text: &str) -> Result<Self> {
        let fields = parse_fields(text);

        match backend {
            BackendType::Memory => {
                let mut stats = MemoryStats::default();
                for (name, value) in fields {
                    match name {
                        "databases" => stats.databases = number(name, value)?,
                        "current_database" => stats.current_database = value.to_string(),
                        "keys" => stats.keys = number(name, value)?,
                        "get_ops" => stats.get_ops = number(name, value)?,
                        "set_ops" => stats.set_ops = number(name, value)?,
                        "del_ops" => stats.del_ops = number(name, value)?,
                        "expired_keys" => stats.expired_keys = number(name, value)?,
                        "used_memory" => stats.used_memory = number(name, value)?,
                        _ => {}
                    }
                }
                Ok(ServerInfo::Memory(stats))
            }
            BackendType::Redb => {
                let mut stats = RedbStats::default();
                for (name, value) in fields {
                    match name {
                        "file_path" => stats.file_path = value.to_string(),
                        "file_size" => stats.file_size = number(name, value)?,
                        "databases" => stats.databases = number(name, value)?,
                        "current_database" => stats.current_database = value.to_string(),
                        "keys" => stats.keys = number(name, value)?,
                        _ => {}
                    }
                }
                Ok(ServerInfo::Redb(stats))
            }
        }
    }

    /// Renders the stats in the same `key:value` format they are parsed from.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = match self {
            ServerInfo::Memory(s) => write!(
                out,
                "# Server\nbackend:memory\ndatabases:{}\ncurrent_database:{}\n\
                 # Stats\nkeys:{}\nget_ops:{}\nset_ops:{}\ndel_ops:{}\nexpired_keys:{}\nused_memory:{}\n",
                s.databases,
                s.current_database,
                s.keys,
                s.get_ops,
                s.set_ops,
                s.del_ops,
                s.expired_keys,
                s.used_memory,
            ),
            ServerInfo::Redb(s) => write!(
                out,
                "# Server\nbackend:redb\nfile_path:{}\nfile_size:{}\ndatabases:{}\ncurrent_database:{}\n\
                 # Stats\nkeys:{}\n",
                s.file_path, s.file_size, s.databases, s.current_database, s.keys,
            ),
        };
        out
    }
}

fn parse_fields(text: &str) -> Vec<(&str, &str)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
        .collect()
}

fn number(name: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::invalid_argument(format!("invalid value for {}: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stats_round_trip() {
        let info = ServerInfo::Memory(MemoryStats {
            databases: 2,
            current_database: "default".to_string(),
            keys: 10,
            get_ops: 3,
            set_ops: 10,
            del_ops: 1,
            expired_keys: 0,
            used_memory: 4096,
        });

        let parsed = ServerInfo::from_text(BackendType::Memory, &info.to_text()).unwrap();
        assert_eq!(parsed, info);
        assert_eq!(parsed.backend(), BackendType::Memory);
    }

    #[test]
    fn test_redb_stats_parsing() {
        let text = "# Server\r\nbackend:redb\r\nfile_path:/tmp/a:b.redb\r\nfile_size:8192\r\nunknown:x\r\n";
        let info = ServerInfo::from_text(BackendType::Redb, text).unwrap();
        match info {
            ServerInfo::Redb(stats) => {
                assert_eq!(stats.file_path, "/tmp/a:b.redb");
                assert_eq!(stats.file_size, 8192);
                assert_eq!(stats.databases, 0);
            }
            other => panic!("unexpected info: {:?}", other),
        }
    }

    #[test]
    fn test_bad_number() {
        let err = ServerInfo::from_text(BackendType::Memory, "keys:many").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_database_info_clone_is_deep() {
        let mut info = DataBaseInfo::new(BackendType::Redb, "default", true, 1);
        info.keys.push(NDbKValue::skeleton("k".into()));

        let mut copy = info.clone();
        copy.keys.clear();
        assert_eq!(info.keys.len(), 1);
    }
}
