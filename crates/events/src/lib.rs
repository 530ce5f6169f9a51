//! GCDEX Events - Domain event log
//!
//! Contracts never write to storage or to the UI directly. They emit
//! `DomainEvent`s into an injected `EventSink`; committed events get a
//! sequence id in the `EventLog`, which is the only feed read views
//! are built from.
//!
//! The JSONL `EventStore` / `EventReader` pair persists any
//! timestamped record append-only, one file per day.

pub mod error;
pub mod event;
pub mod log;
pub mod reader;
pub mod sink;
pub mod store;

pub use error::EventError;
pub use event::{DomainEvent, EventRecord};
pub use log::EventLog;
pub use reader::EventReader;
pub use sink::{EventSink, PendingEvent};
pub use store::{EventStore, Timestamped};
