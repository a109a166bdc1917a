//! Backends and the Driver Registry
//!
//! Each backend is a [`NativeBackend`] implementation. The registry maps a
//! [`BackendType`] to a factory that builds a boxed driver for it:
//!
//! ```text
//! DriverRegistry
//!   ├── memory ──> Driver<MemoryBackend> (shared command table)
//!   └── redb   ──> Driver<RedbBackend>   (shared command table)
//! ```
//!
//! The registry is built once at startup and passed around explicitly.
//! Each command table is built once and shared by every driver of that
//! backend.

pub mod memory;
pub mod redb;

use crate::commands::command_table;
use crate::config::LocalConfig;
use crate::connection::NativeBackend;
use crate::driver::{BackendDriver, Driver};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use self::memory::MemoryBackend;
pub use self::redb::RedbBackend;

/// Tag identifying a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    Memory,
    Redb,
}

impl BackendType {
    /// Every supported backend.
    pub const ALL: [BackendType; 2] = [BackendType::Memory, BackendType::Redb];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            BackendType::Memory => "memory",
            BackendType::Redb => "redb",
        }
    }

    /// Config used when the user supplies none.
    pub fn default_config(self) -> LocalConfig {
        match self {
            BackendType::Memory => LocalConfig::new("default"),
            BackendType::Redb => LocalConfig::new("~/test.redb"),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BackendType::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_argument(format!("unknown backend '{}'", s)))
    }
}

/// What to connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub backend: BackendType,
    pub config: LocalConfig,
}

impl ConnectionSettings {
    pub fn new(backend: BackendType, config: LocalConfig) -> Self {
        Self { backend, config }
    }

    /// Parses a backend name and a single-line config on top of the
    /// backend's defaults.
    pub fn parse(backend: &str, config_line: &str) -> Result<Self> {
        let backend: BackendType = backend.parse()?;
        let mut config = backend.default_config();
        config.apply_line(config_line);
        Ok(Self { backend, config })
    }
}

type DriverFactory = Box<dyn Fn(LocalConfig) -> Box<dyn BackendDriver> + Send + Sync>;

/// Creates drivers by backend type.
pub struct DriverRegistry {
    factories: HashMap<BackendType, DriverFactory>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("backends", &self.backends())
            .finish()
    }
}

impl DriverRegistry {
    /// A registry with every built-in backend.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<MemoryBackend>();
        registry.register::<RedbBackend>();
        registry
    }

    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers backend `B`, building its command table once.
    pub fn register<B: NativeBackend>(&mut self) {
        let table = Arc::new(command_table::<B>());
        self.factories.insert(
            B::TYPE,
            Box::new(move |config: LocalConfig| -> Box<dyn BackendDriver> {
                Box::new(Driver::<B>::new(config, Arc::clone(&table)))
            }),
        );
    }

    /// Registered backends in canonical order.
    pub fn backends(&self) -> Vec<BackendType> {
        BackendType::ALL
            .into_iter()
            .filter(|b| self.factories.contains_key(b))
            .collect()
    }

    /// Builds a disconnected driver for `settings`.
    pub fn create(&self, settings: &ConnectionSettings) -> Result<Box<dyn BackendDriver>> {
        let factory = self.factories.get(&settings.backend).ok_or_else(|| {
            Error::invalid_argument(format!("backend '{}' is not registered", settings.backend))
        })?;
        Ok(factory(settings.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!("memory".parse::<BackendType>().unwrap(), BackendType::Memory);
        assert_eq!(" REDB ".parse::<BackendType>().unwrap(), BackendType::Redb);
        assert!(matches!(
            "leveldb".parse::<BackendType>(),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(BackendType::Redb.to_string(), "redb");
    }

    #[test]
    fn test_settings_parse() {
        let settings = ConnectionSettings::parse("redb", "-f /tmp/x.redb -c").unwrap();
        assert_eq!(settings.backend, BackendType::Redb);
        assert_eq!(settings.config.db_name, "/tmp/x.redb");
        assert!(settings.config.create_if_missing);

        let settings = ConnectionSettings::parse("memory", "").unwrap();
        assert_eq!(settings.config, LocalConfig::new("default"));
    }

    #[test]
    fn test_registry_creates_drivers() {
        let registry = DriverRegistry::new();
        assert_eq!(registry.backends(), vec![BackendType::Memory, BackendType::Redb]);

        let driver = registry
            .create(&ConnectionSettings::new(
                BackendType::Memory,
                LocalConfig::new("default"),
            ))
            .unwrap();
        assert_eq!(driver.backend(), BackendType::Memory);
        assert!(!driver.is_connected());

        let empty = DriverRegistry::empty();
        assert!(empty
            .create(&ConnectionSettings::new(
                BackendType::Redb,
                LocalConfig::new("x"),
            ))
            .is_err());
    }
}
