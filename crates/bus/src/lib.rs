//! GCDEX Event Bus - In-process async event distribution
//!
//! Carries committed `EventRecord`s to read-side subscribers
//! (projections, live listeners).
//!
//! - Live fan-out over a tokio broadcast channel
//! - `EventSubscriber` trait for async handlers
//! - Ordered batch dispatch and full replay from the event log
//! - No retention in the bus; the runtime's log is the only history

pub mod channel;
pub mod error;
pub mod subscriber;

pub use channel::{EventBus, DEFAULT_CAPACITY};
pub use error::BusError;
pub use subscriber::EventSubscriber;
