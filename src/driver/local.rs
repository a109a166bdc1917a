//! Local Backend Driver
//!
//! Binds one [`Connection`] to the command table of its backend and turns
//! [`Request`]s into connection calls.
//!
//! Every command the driver runs, whether typed by the user or issued on
//! its behalf, is logged at DEBUG with the backend name and the command
//! line.

use crate::backends::BackendType;
use crate::commands::{command_lines, split_command_line, CommandHandler, CommandTable};
use crate::config::LocalConfig;
use crate::connection::{Connection, InterruptFlag, NativeBackend};
use crate::driver::events::{CommandResult, EventSink, KeyCommand, Request, Response};
use crate::error::{Error, Result};
use crate::value::{Key, NDbKValue, Value};
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Object-safe face of a driver, used by the worker and the registry.
pub trait BackendDriver: Send {
    fn backend(&self) -> BackendType;

    /// The flag that stops a running `Execute`.
    fn interrupt_flag(&self) -> InterruptFlag;

    fn is_connected(&self) -> bool;

    /// Runs one request to completion, reporting progress to `sink`.
    fn handle(&mut self, request: Request, sink: &mut dyn EventSink) -> Result<Response>;
}

/// Driver for a backend implementing [`NativeBackend`].
pub struct Driver<B: NativeBackend> {
    connection: Connection<B>,
    handler: CommandHandler<Connection<B>>,
}

impl<B: NativeBackend> Driver<B> {
    pub fn new(config: LocalConfig, table: Arc<CommandTable<Connection<B>>>) -> Self {
        Self {
            connection: Connection::new(config, InterruptFlag::new()),
            handler: CommandHandler::new(table),
        }
    }

    pub fn connection(&self) -> &Connection<B> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection<B> {
        &mut self.connection
    }

    /// Tokenizes and runs a single command line.
    pub fn execute_line(&mut self, line: &str) -> Result<CommandResult> {
        let argv = split_command_line(line)?;
        self.execute_argv(line, &argv)
    }

    fn execute_argv(&mut self, line: &str, argv: &[Bytes]) -> Result<CommandResult> {
        log_command(B::TYPE, line);
        let mut values = Vec::new();
        self.handler.execute(&mut self.connection, argv, &mut values)?;
        Ok(CommandResult {
            command: line.to_string(),
            values,
        })
    }

    /// Runs a script line by line, stopping at the first error.
    ///
    /// The interrupt flag is cleared on entry and checked before each line.
    /// A script without any executable line fails with `InvalidArgument`.
    fn execute(&mut self, text: &str, sink: &mut dyn EventSink) -> Result<Response> {
        self.connection.set_interrupted(false);

        let lines: Vec<&str> = command_lines(text).collect();
        let total = lines.len();
        if total == 0 {
            return Err(Error::invalid_argument("empty command line"));
        }

        for (i, line) in lines.into_iter().enumerate() {
            if self.connection.is_interrupted() {
                debug!(backend = %B::TYPE, executed = i, "Execution interrupted");
                return Err(Error::Interrupted);
            }

            let result = self.execute_line(line)?;
            sink.output(result);
            sink.progress(((i + 1) * 100 / total) as u8);
        }

        Ok(Response::Executed { lines: total })
    }

    fn load_database_content(&mut self, cursor: u64, pattern: &str, count: u64) -> Result<Response> {
        let argv: Vec<Bytes> = vec![
            Bytes::from_static(b"SCAN"),
            Bytes::from(cursor.to_string()),
            Bytes::from_static(b"MATCH"),
            Bytes::copy_from_slice(pattern.as_bytes()),
            Bytes::from_static(b"COUNT"),
            Bytes::from(count.to_string()),
        ];
        let line = format!(
            "SCAN {} MATCH {} COUNT {}",
            cursor,
            Value::string(pattern).convert(" ", true),
            count
        );

        let result = self.execute_argv(&line, &argv)?;
        let (keys, next) = decode_scan_reply(&result.values)?;
        let db_keys_count = self.connection.db_size()?;

        Ok(Response::DatabaseContent {
            keys: keys.into_iter().map(NDbKValue::skeleton).collect(),
            cursor: next,
            db_keys_count,
        })
    }

    fn key_command(&mut self, command: KeyCommand) -> Result<Response> {
        match command {
            KeyCommand::Load(key) => {
                log_command(B::TYPE, &format!("GET {}", key_arg(&key)));
                Ok(Response::KeyLoaded(self.connection.get(&key)?))
            }
            KeyCommand::Create(item) => {
                log_command(
                    B::TYPE,
                    &format!("SET {} {}", key_arg(&item.key), item.value.convert(" ", true)),
                );
                Ok(Response::KeyCreated(self.connection.set(item)?))
            }
            KeyCommand::Delete(keys) => {
                let args: Vec<String> = keys.iter().map(key_arg).collect();
                log_command(B::TYPE, &format!("DEL {}", args.join(" ")));
                Ok(Response::KeysDeleted(self.connection.delete(&keys)?))
            }
            KeyCommand::Rename { key, new_key } => {
                log_command(
                    B::TYPE,
                    &format!("RENAME {} {}", key_arg(&key), key_arg(&new_key)),
                );
                self.connection.rename(&key, new_key.clone())?;
                Ok(Response::KeyRenamed { key, new_key })
            }
            KeyCommand::ChangeTtl { key, seconds } => {
                log_command(B::TYPE, &format!("EXPIRE {} {}", key_arg(&key), seconds));
                let applied = self.connection.expire(&key, seconds)?;
                Ok(Response::TtlChanged { key, applied })
            }
        }
    }
}

impl<B: NativeBackend> BackendDriver for Driver<B> {
    fn backend(&self) -> BackendType {
        B::TYPE
    }

    fn interrupt_flag(&self) -> InterruptFlag {
        self.connection.interrupt_flag().clone()
    }

    fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn handle(&mut self, request: Request, sink: &mut dyn EventSink) -> Result<Response> {
        match request {
            Request::Connect => {
                self.connection.connect()?;
                Ok(Response::Connected)
            }
            Request::Disconnect => {
                self.connection.disconnect()?;
                Ok(Response::Disconnected)
            }
            Request::Execute { text } => self.execute(&text, sink),
            Request::LoadDatabaseContent {
                cursor,
                pattern,
                count,
            } => self.load_database_content(cursor, &pattern, count),
            Request::ClearDatabase => {
                log_command(B::TYPE, "FLUSHDB");
                self.connection.flush_db()?;
                Ok(Response::DatabaseCleared)
            }
            Request::ServerInfo => Ok(Response::ServerInfo(self.connection.server_info()?)),
            Request::DiscoveryInfo => Ok(Response::Discovery {
                server: self.connection.server_info()?,
                database: self.connection.current_database_info()?,
            }),
            Request::ServerCommands => Ok(Response::Commands(self.handler.table().infos())),
            Request::Key(command) => self.key_command(command),
        }
    }
}

/// The command logger.
fn log_command(backend: BackendType, line: &str) {
    debug!(backend = %backend, command = line, "Executing command");
}

/// A key as a command-line token that tokenizes back to the same bytes.
fn key_arg(key: &Key) -> String {
    key.to_value().convert(" ", true)
}

/// Splits a `SCAN` reply `[cursor, [key ...]]`.
fn decode_scan_reply(values: &[Value]) -> Result<(Vec<Key>, u64)> {
    let malformed = || Error::invalid_argument("malformed SCAN reply");

    let parts = values.first().and_then(Value::as_array).ok_or_else(malformed)?;
    let (cursor, keys) = match parts {
        [cursor, keys] => (cursor, keys),
        _ => return Err(malformed()),
    };

    let cursor = cursor
        .as_str()
        .and_then(|c| c.parse().ok())
        .ok_or_else(malformed)?;

    let keys = keys
        .as_array()
        .ok_or_else(malformed)?
        .iter()
        .map(|key| match key {
            Value::String(s) => Ok(Key::from(s.as_str())),
            Value::ByteArray(b) => Ok(Key::new(b.clone())),
            _ => Err(malformed()),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((keys, cursor))
}
