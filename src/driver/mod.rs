//! Drivers
//!
//! A driver owns one connection and answers [`Request`]s with a stream of
//! [`DriverEvent`]s. [`spawn_driver`] runs it on a worker thread behind a
//! cloneable [`DriverHandle`].

pub mod events;
pub mod local;
pub mod worker;

pub use events::{
    CollectingSink, CommandResult, DriverEvent, EventSink, KeyCommand, NullSink, Request, Response,
};
pub use local::{BackendDriver, Driver};
pub use worker::{spawn_driver, Completion, DriverHandle};
