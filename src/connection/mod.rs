//! Connection Layer
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Connection<B>                           │
//! │                                                             │
//! │  set / get / delete / rename / scan / keys / db_size ...    │
//! │  value encoding, glob filtering, cursor synthesis           │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ primitives + check_result
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │             B: NativeBackend (memory, redb)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The interrupt flag is shared between a connection and whoever wants to
//! stop it; see [`InterruptFlag`].

pub mod generic;
pub mod interrupt;
pub mod native;
pub mod pattern;

pub use generic::{Connection, ConnectionState};
pub use interrupt::InterruptFlag;
pub use native::{Capabilities, NativeBackend};
pub use pattern::GlobPattern;
