//! Command Handler
//!
//! Validates an argv vector against a [`CommandTable`], resolves the most
//! specific matching command and invokes it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CommandHandler                          │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │   lookup()  │───>│ validate()  │───>│  invoke()   │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │         │                  │                  │             │
//! │         ▼                  ▼                  ▼             │
//! │  UnknownCommand   InvalidArgumentCount   handler error      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The handler never retries and never rewrites the error a command
//! returns; it only adds the two lookup failures above.

use crate::commands::holder::CommandTable;
use crate::error::{Error, Result};
use crate::value::Value;
use bytes::Bytes;
use std::sync::Arc;
use tracing::trace;

/// Dispatches argv vectors to the commands of one table.
pub struct CommandHandler<C> {
    table: Arc<CommandTable<C>>,
}

impl<C> Clone for CommandHandler<C> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<C> CommandHandler<C> {
    /// Creates a handler over a shared command table.
    pub fn new(table: Arc<CommandTable<C>>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CommandTable<C> {
        &self.table
    }

    /// Executes one command.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The context the command operates on (usually a connection)
    /// * `argv` - Command name token(s) followed by the arguments
    /// * `out` - Sink the command writes its reply values to
    pub fn execute(&self, ctx: &mut C, argv: &[Bytes], out: &mut Vec<Value>) -> Result<()> {
        if argv.is_empty() {
            return Err(Error::invalid_argument("empty command"));
        }

        let (holder, consumed) = self
            .table
            .find(argv)
            .ok_or_else(|| Error::UnknownCommand(String::from_utf8_lossy(&argv[0]).into_owned()))?;

        let args = &argv[consumed..];
        if !holder.info.accepts(args.len()) {
            return Err(Error::InvalidArgumentCount {
                command: holder.info.name.to_string(),
                usage: holder.info.params.to_string(),
                given: args.len(),
            });
        }

        trace!(command = holder.info.name, args = args.len(), "Dispatching command");
        holder.invoke(ctx, args, out)
    }
}
