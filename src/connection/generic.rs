//! Generic Connection
//!
//! `Connection<B>` implements the common key-value operation set for any
//! backend `B` in terms of the backend's native primitives.
//!
//! ## Guarantees
//!
//! - Every operation needs an open native handle and fails with
//!   `NotConnected` otherwise.
//! - Native errors pass through `B::check_result` exactly once.
//! - A failing step of a multi-step operation aborts the remaining steps.
//!
//! ## Known Limitation: Rename
//!
//! `rename` is get + set + delete. It is not atomic: between the set and
//! the delete both keys are visible, and a failure after the set leaves the
//! copy behind. There is no rollback.
//!
//! ## Concurrency
//!
//! A connection is owned by one worker at a time. It must not be entered
//! from two threads at once; this is a precondition of the type (methods
//! that write take `&mut self`), not something it checks at runtime.

use crate::backends::BackendType;
use crate::config::LocalConfig;
use crate::connection::interrupt::InterruptFlag;
use crate::connection::native::NativeBackend;
use crate::connection::pattern::GlobPattern;
use crate::error::{Error, Result};
use crate::info::{DataBaseInfo, ServerInfo};
use crate::value::{decode_value, encode_value, Key, NDbKValue};
use std::time::Duration;
use tracing::{info, warn};

/// Connection state as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// A backend-agnostic connection wrapping one native handle.
pub struct Connection<B: NativeBackend> {
    handle: Option<B>,
    config: LocalConfig,
    interrupt: InterruptFlag,
}

impl<B: NativeBackend> Connection<B> {
    /// Creates a disconnected connection.
    pub fn new(config: LocalConfig, interrupt: InterruptFlag) -> Self {
        Self {
            handle: None,
            config,
            interrupt,
        }
    }

    pub fn backend_type(&self) -> BackendType {
        B::TYPE
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        if self.handle.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn interrupt_flag(&self) -> &InterruptFlag {
        &self.interrupt
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_interrupted()
    }

    pub fn set_interrupted(&self, interrupted: bool) {
        self.interrupt.set(interrupted);
    }

    /// Opens the native handle. Does nothing if already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = B::open(&self.config).map_err(|e| {
            warn!(backend = %B::TYPE, error = %e, "Connect failed");
            Error::ConnectionError(e.to_string())
        })?;

        info!(backend = %B::TYPE, db = %self.config.db_name, "Connected");
        self.handle = Some(handle);
        Ok(())
    }

    /// Releases the native handle. Calling it while disconnected is a no-op.
    pub fn disconnect(&mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => {
                Self::check("DISCONNECT", handle.close())?;
                info!(backend = %B::TYPE, "Disconnected");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Releases the native handle; later operations fail with `NotConnected`.
    pub fn quit(&mut self) -> Result<()> {
        if self.handle.is_none() {
            return Err(Error::NotConnected);
        }
        self.disconnect()
    }

    /// Stores an item and echoes it back.
    pub fn set(&mut self, item: NDbKValue) -> Result<NDbKValue> {
        let raw = encode_value(&item.value)?;
        let native = self.native_mut()?;
        Self::check("SET", native.put(item.key.as_bytes(), &raw))?;
        Ok(item)
    }

    /// Loads an item; fails with `KeyNotFound` if the key is absent.
    pub fn get(&self, key: &Key) -> Result<NDbKValue> {
        let native = self.native()?;
        let raw = Self::check("GET", native.get(key.as_bytes()))?
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;
        Ok(NDbKValue::new(key.clone(), decode_value(&raw)))
    }

    /// Deletes each key independently and returns the ones that were removed.
    pub fn delete(&mut self, keys: &[Key]) -> Result<Vec<Key>> {
        let native = self.native_mut()?;
        let mut removed = Vec::with_capacity(keys.len());
        for key in keys {
            if Self::check("DEL", native.remove(key.as_bytes()))? {
                removed.push(key.clone());
            }
        }
        Ok(removed)
    }

    /// Renames a key via get + set + delete. See the module docs.
    ///
    /// Renaming a key to itself only checks that it exists.
    pub fn rename(&mut self, key: &Key, new_key: Key) -> Result<()> {
        self.native()?;
        if !B::capabilities().rename {
            return Err(Error::not_supported("RENAME", B::TYPE.name()));
        }

        let item = self.get(key)?;
        if *key == new_key {
            return Ok(());
        }
        self.set(NDbKValue::new(new_key, item.value))?;
        self.delete(std::slice::from_ref(key))?;
        Ok(())
    }

    /// One page of a resumable scan.
    ///
    /// `cursor` 0 starts a new scan. The returned cursor is the position of
    /// the next matching key, or 0 when the scan is complete. Positions are
    /// counted over matching keys in ascending key order, so the result is
    /// consistent as of each call, not as of a snapshot.
    pub fn scan(&self, cursor: u64, pattern: &str, count: u64) -> Result<(Vec<Key>, u64)> {
        if count == 0 {
            return Err(Error::invalid_argument("scan count must be positive"));
        }

        let native = self.native()?;
        let matcher = GlobPattern::new(pattern);
        let mut position = 0u64;
        let mut keys = Vec::new();
        let mut more = false;

        Self::check(
            "SCAN",
            native.visit_keys(&mut |key| {
                if !matcher.matches(key) {
                    return true;
                }
                if position < cursor {
                    position += 1;
                    return true;
                }
                if keys.len() as u64 == count {
                    more = true;
                    return false;
                }
                keys.push(Key::from(key));
                position += 1;
                true
            }),
        )?;

        let next = if more { cursor + keys.len() as u64 } else { 0 };
        Ok((keys, next))
    }

    /// Keys in the inclusive range `[start, end]`, at most `limit`.
    pub fn keys(&self, start: &Key, end: &Key, limit: u64) -> Result<Vec<Key>> {
        let native = self.native()?;
        if start > end {
            return Ok(Vec::new());
        }
        let keys = Self::check(
            "KEYS",
            native.range_keys(start.as_bytes(), end.as_bytes(), limit),
        )?;
        Ok(keys.into_iter().map(Key::from).collect())
    }

    /// Number of items in the current database.
    pub fn db_size(&self) -> Result<u64> {
        let native = self.native()?;
        Self::check("DBKCOUNT", native.count())
    }

    pub fn flush_db(&mut self) -> Result<()> {
        let native = self.native_mut()?;
        Self::check("FLUSHDB", native.clear())?;
        info!(backend = %B::TYPE, db = native.current_database(), "Database flushed");
        Ok(())
    }

    pub fn create_db(&mut self, name: &str) -> Result<DataBaseInfo> {
        let native = self.native_mut()?;
        Self::check("CREATEDB", native.create_database(name))?;
        Ok(DataBaseInfo::new(B::TYPE, name, false, 0))
    }

    pub fn remove_db(&mut self, name: &str) -> Result<DataBaseInfo> {
        let native = self.native_mut()?;
        Self::check("REMOVEDB", native.remove_database(name))?;
        Ok(DataBaseInfo::new(B::TYPE, name, false, 0))
    }

    /// Switches the active database; fails with `DatabaseNotFound` if absent.
    pub fn select_db(&mut self, name: &str) -> Result<DataBaseInfo> {
        let native = self.native_mut()?;
        Self::check("SELECT", native.select_database(name))?;
        info!(backend = %B::TYPE, db = name, "Database selected");
        self.current_database_info()
    }

    /// Info about the active database.
    pub fn current_database_info(&self) -> Result<DataBaseInfo> {
        let native = self.native()?;
        let size = Self::check("DBKCOUNT", native.count())?;
        Ok(DataBaseInfo::new(
            B::TYPE,
            native.current_database(),
            true,
            size,
        ))
    }

    pub fn current_database(&self) -> Result<String> {
        Ok(self.native()?.current_database().to_string())
    }

    pub fn databases(&self) -> Result<Vec<String>> {
        let native = self.native()?;
        Self::check("DATABASES", native.databases())
    }

    pub fn server_info(&self) -> Result<ServerInfo> {
        let native = self.native()?;
        let text = Self::check("INFO", native.stats_text())?;
        ServerInfo::from_text(B::TYPE, &text)
    }

    /// Raw stats blob, as printed by `INFO`.
    pub fn server_info_text(&self) -> Result<String> {
        let native = self.native()?;
        Self::check("INFO", native.stats_text())
    }

    /// Sets a TTL in seconds. Returns false if the key does not exist.
    pub fn expire(&mut self, key: &Key, seconds: u64) -> Result<bool> {
        let native = self.native_mut()?;
        if !B::capabilities().ttl {
            return Err(Error::not_supported("EXPIRE", B::TYPE.name()));
        }
        Self::check(
            "EXPIRE",
            native.expire(key.as_bytes(), Duration::from_secs(seconds)),
        )
    }

    /// Remaining TTL in seconds; `-1` without expiry, `-2` if missing.
    pub fn ttl(&self, key: &Key) -> Result<i64> {
        let native = self.native()?;
        if !B::capabilities().ttl {
            return Err(Error::not_supported("TTL", B::TYPE.name()));
        }
        Self::check("TTL", native.ttl(key.as_bytes()))
    }

    /// Direct access to the native handle.
    pub fn native(&self) -> Result<&B> {
        self.handle.as_ref().ok_or(Error::NotConnected)
    }

    pub fn native_mut(&mut self) -> Result<&mut B> {
        self.handle.as_mut().ok_or(Error::NotConnected)
    }

    fn check<T>(command: &str, result: std::result::Result<T, B::Error>) -> Result<T> {
        result.map_err(|e| {
            let err = B::check_result(command, e);
            warn!(backend = %B::TYPE, command, error = %err, "Native call failed");
            err
        })
    }
}

impl<B: NativeBackend> Drop for Connection<B> {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            warn!(backend = %B::TYPE, error = %e, "Error closing connection");
        }
    }
}
