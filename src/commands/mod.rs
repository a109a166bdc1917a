//! Command Layer
//!
//! Turns a line of text into a call on a connection.
//!
//! ## Architecture
//!
//! ```text
//! "SCAN 0 MATCH user:* COUNT 10"
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Tokenizer      │  (parser)
//! └────────┬────────┘
//!          │ argv
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  longest-name lookup + arity check (handler, holder)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Connection<B>   │  (connection module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! ### Key Commands
//! - `SET`, `GET`, `DEL`, `RENAME`
//! - `EXPIRE`, `TTL`
//! - `SCAN`, `KEYS`
//!
//! ### Database Commands
//! - `DBKCOUNT`, `FLUSHDB`
//! - `CREATEDB`, `REMOVEDB`, `SELECT`
//!
//! ### Server Commands
//! - `INFO`, `CONFIG GET`, `HELP`, `QUIT`
//! - `PURGE` (memory backend only)

pub mod builtin;
pub mod handler;
pub mod holder;
pub mod parser;

pub use builtin::{builtin_commands, command_table, DEFAULT_SCAN_COUNT};
pub use handler::CommandHandler;
pub use holder::{CommandFn, CommandHolder, CommandInfo, CommandTable, INFINITE_ARGS, UNDEFINED};
pub use parser::{arg_text, command_lines, display_args, split_command_line};
