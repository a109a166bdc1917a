//! The Native Backend Contract
//!
//! A backend plugs into the generic [`Connection`] by supplying a handful
//! of primitive calls on its native handle. Every primitive returns the
//! backend's own error type; the generic connection converts those errors
//! through [`NativeBackend::check_result`] and nowhere else.
//!
//! Primitives work on raw bytes. Value encoding, glob filtering, cursor
//! synthesis and rename are all done once in the generic layer.

use crate::backends::BackendType;
use crate::commands::CommandHolder;
use crate::config::LocalConfig;
use crate::connection::generic::Connection;
use crate::error::Error;
use std::time::Duration;

/// Optional operations a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Rename via get + set + delete
    pub rename: bool,
    /// Per-key expiry
    pub ttl: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            rename: true,
            ttl: false,
        }
    }
}

/// Primitive operations on one backend's native handle.
pub trait NativeBackend: Send + Sized + 'static {
    /// The backend's own error type
    type Error: std::error::Error;

    /// Tag of this backend
    const TYPE: BackendType;

    /// Opens the native handle.
    fn open(config: &LocalConfig) -> Result<Self, Self::Error>;

    /// Releases the native handle.
    fn close(self) -> Result<(), Self::Error>;

    /// Translates a native error into the crate error taxonomy.
    ///
    /// This is the single place where native codes are classified.
    fn check_result(command: &str, err: Self::Error) -> Error;

    fn capabilities() -> Capabilities {
        Capabilities::default()
    }

    /// Commands this backend adds on top of the common table.
    fn extra_commands() -> Vec<CommandHolder<Connection<Self>>> {
        Vec::new()
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Self::Error>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), Self::Error>;

    /// Removes a key. Returns whether it existed; backends that cannot
    /// tell report `true`.
    fn remove(&mut self, key: &[u8]) -> Result<bool, Self::Error>;

    /// Visits every key of the current database in ascending byte order
    /// until `visit` returns `false`.
    fn visit_keys(&self, visit: &mut dyn FnMut(&[u8]) -> bool) -> Result<(), Self::Error>;

    /// Keys in `[start, end]`, at most `limit` of them, in ascending order.
    fn range_keys(&self, start: &[u8], end: &[u8], limit: u64) -> Result<Vec<Vec<u8>>, Self::Error> {
        let mut keys = Vec::new();
        if limit == 0 {
            return Ok(keys);
        }
        self.visit_keys(&mut |key| {
            if key > end {
                return false;
            }
            if key >= start {
                keys.push(key.to_vec());
            }
            (keys.len() as u64) < limit
        })?;
        Ok(keys)
    }

    /// Number of items in the current database.
    fn count(&self) -> Result<u64, Self::Error>;

    /// Removes every item of the current database.
    fn clear(&mut self) -> Result<(), Self::Error>;

    fn current_database(&self) -> &str;

    fn databases(&self) -> Result<Vec<String>, Self::Error>;

    fn create_database(&mut self, name: &str) -> Result<(), Self::Error>;

    fn remove_database(&mut self, name: &str) -> Result<(), Self::Error>;

    fn select_database(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Statistics as a `key:value` text blob.
    fn stats_text(&self) -> Result<String, Self::Error>;

    /// Sets an expiry on a key. Only called when `capabilities().ttl`.
    fn expire(&mut self, _key: &[u8], _ttl: Duration) -> Result<bool, Self::Error> {
        Ok(false)
    }

    /// Remaining TTL in seconds: `-1` without expiry, `-2` for a missing
    /// key. Only called when `capabilities().ttl`.
    fn ttl(&self, _key: &[u8]) -> Result<i64, Self::Error> {
        Ok(-1)
    }
}
