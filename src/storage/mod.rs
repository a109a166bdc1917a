//! In-Process Storage
//!
//! The byte store behind the memory backend: 64 hash-selected shards, each
//! an `RwLock`ed map, with optional per-key deadlines that are enforced
//! lazily.

pub mod engine;

pub use engine::{StorageEngine, StorageStats};
