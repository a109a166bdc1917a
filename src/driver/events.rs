//! Driver Requests and Events
//!
//! A request goes in, a stream of events comes out:
//!
//! ```text
//! Request::Execute { "SET a 1\nGET a" }
//!     │
//!     ├── Progress(0)
//!     ├── Output(SET a 1 -> OK)
//!     ├── Progress(50)
//!     ├── Output(GET a -> 1)
//!     ├── Progress(100)
//!     └── Finished(Ok(Executed { lines: 2 }))
//! ```
//!
//! Progress never goes down, starts at 0 and ends at 100. `Finished` is
//! always the last event of a request.

use crate::commands::CommandInfo;
use crate::error::Result;
use crate::info::{DataBaseInfo, ServerInfo};
use crate::value::{Key, NDbKValue, Value};

/// Typed single-key operations.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyCommand {
    Load(Key),
    Create(NDbKValue),
    Delete(Vec<Key>),
    Rename { key: Key, new_key: Key },
    ChangeTtl { key: Key, seconds: u64 },
}

/// Work a driver can be asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Connect,
    Disconnect,
    /// Runs every non-empty, non-comment line of `text` in order.
    Execute { text: String },
    /// One page of keys of the current database.
    LoadDatabaseContent {
        cursor: u64,
        pattern: String,
        count: u64,
    },
    ClearDatabase,
    ServerInfo,
    /// Server info plus the current database info.
    DiscoveryInfo,
    /// Metadata of every command the backend understands.
    ServerCommands,
    Key(KeyCommand),
}

impl Request {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Connect => "connect",
            Request::Disconnect => "disconnect",
            Request::Execute { .. } => "execute",
            Request::LoadDatabaseContent { .. } => "load_database_content",
            Request::ClearDatabase => "clear_database",
            Request::ServerInfo => "server_info",
            Request::DiscoveryInfo => "discovery_info",
            Request::ServerCommands => "server_commands",
            Request::Key(KeyCommand::Load(_)) => "key_load",
            Request::Key(KeyCommand::Create(_)) => "key_create",
            Request::Key(KeyCommand::Delete(_)) => "key_delete",
            Request::Key(KeyCommand::Rename { .. }) => "key_rename",
            Request::Key(KeyCommand::ChangeTtl { .. }) => "key_change_ttl",
        }
    }
}

/// The reply values of one executed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub command: String,
    pub values: Vec<Value>,
}

impl CommandResult {
    /// Human-readable reply, values joined by `delimiter`.
    pub fn to_human_readable(&self, delimiter: &str) -> String {
        self.values
            .iter()
            .map(|v| v.to_human_readable(delimiter))
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

/// Final outcome of a successful request.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Connected,
    Disconnected,
    Executed {
        lines: usize,
    },
    DatabaseContent {
        keys: Vec<NDbKValue>,
        /// Cursor of the next page; 0 when the scan is complete
        cursor: u64,
        db_keys_count: u64,
    },
    DatabaseCleared,
    ServerInfo(ServerInfo),
    Discovery {
        server: ServerInfo,
        database: DataBaseInfo,
    },
    Commands(Vec<CommandInfo>),
    KeyLoaded(NDbKValue),
    KeyCreated(NDbKValue),
    KeysDeleted(Vec<Key>),
    KeyRenamed {
        key: Key,
        new_key: Key,
    },
    TtlChanged {
        key: Key,
        applied: bool,
    },
}

/// Events emitted while a request runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Progress(u8),
    Output(CommandResult),
    Finished(Result<Response>),
}

/// Receives intermediate events from a running request.
pub trait EventSink {
    fn progress(&mut self, percent: u8);

    fn output(&mut self, result: CommandResult);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn progress(&mut self, _percent: u8) {}

    fn output(&mut self, _result: CommandResult) {}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub progress: Vec<u8>,
    pub outputs: Vec<CommandResult>,
}

impl EventSink for CollectingSink {
    fn progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }

    fn output(&mut self, result: CommandResult) {
        self.outputs.push(result);
    }
}
