//! # kvbridge - One Command Protocol over Many Key-Value Backends
//!
//! kvbridge gives every key-value backend the same text command set, the
//! same value model and the same asynchronous driver interface. A backend
//! only supplies a handful of native primitives; everything else is shared.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              kvbridge                                   │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │DriverHandle │───>│   Worker    │───>│  Driver<B>  │                  │
//! │  │ (async API) │    │ (blocking)  │    │             │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     ▼                                                 ▼ │
//! │  ┌──────────────────────────────┐    ┌──────────────────────────────┐  │
//! │  │ CommandHandler + CommandTable│───>│        Connection<B>         │  │
//! │  └──────────────────────────────┘    └──────────────┬───────────────┘  │
//! │                                                     │                  │
//! │                              ┌──────────────────────┴────────┐         │
//! │                              ▼                               ▼         │
//! │                    ┌──────────────────┐          ┌──────────────────┐  │
//! │                    │  MemoryBackend   │          │   RedbBackend    │  │
//! │                    │ (sharded engine) │          │  (redb tables)   │  │
//! │                    └──────────────────┘          └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use kvbridge::backends::{ConnectionSettings, DriverRegistry};
//! use kvbridge::driver::{spawn_driver, Request};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = DriverRegistry::new();
//!     let settings = ConnectionSettings::parse("memory", "-f default")?;
//!     let handle = spawn_driver(registry.create(&settings)?);
//!
//!     handle.call(Request::Connect).await?.result?;
//!     let done = handle
//!         .call(Request::Execute { text: "SET name Ariz\nGET name".to_string() })
//!         .await?;
//!
//!     for output in done.outputs {
//!         println!("{}", output.to_human_readable("\n"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`value`]: the value model, its text rendering and stored encoding
//! - [`commands`]: tokenizer, command table and the built-in commands
//! - [`connection`]: the generic connection over native backends
//! - [`backends`]: memory and redb backends, backend registry
//! - [`driver`]: request/event drivers and the blocking worker
//! - [`storage`]: the sharded engine behind the memory backend
//! - [`info`]: server and database descriptors
//! - [`config`]: backend connection config

pub mod backends;
pub mod commands;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod info;
pub mod storage;
pub mod value;

// Re-export commonly used types for convenience
pub use backends::{BackendType, ConnectionSettings, DriverRegistry};
pub use commands::{CommandHandler, CommandInfo, CommandTable};
pub use config::LocalConfig;
pub use connection::{Connection, InterruptFlag, NativeBackend};
pub use driver::{spawn_driver, DriverEvent, DriverHandle, Request, Response};
pub use error::{Error, Result};
pub use info::{DataBaseInfo, ServerInfo};
pub use value::{Key, NDbKValue, Value, ValueType};

/// Version of kvbridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
