//! Event sink - the capability contracts emit through

use crate::event::DomainEvent;
use gcdex_core::Address;

/// An event emitted by a contract but not yet committed to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub emitter: Address,
    pub event: DomainEvent,
}

/// Destination for contract events.
///
/// Contracts only emit after every pre-condition of an operation has
/// passed, so a sink never sees events of a rejected operation.
pub trait EventSink {
    /// Record an event emitted by the contract at `emitter`
    fn emit(&mut self, emitter: Address, event: DomainEvent);
}

/// Buffers events of a single transaction until it commits
impl EventSink for Vec<PendingEvent> {
    fn emit(&mut self, emitter: Address, event: DomainEvent) {
        self.push(PendingEvent { emitter, event });
    }
}
