//! In-memory append-only event log

use crate::event::{DomainEvent, EventRecord};
use crate::sink::PendingEvent;
use gcdex_core::Address;

/// Append-only, totally ordered event log.
///
/// Ids are assigned on append, starting at 1. Nothing is ever removed
/// or rewritten.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of events produced by one transaction.
    ///
    /// Returns the committed records in emission order.
    pub fn append(
        &mut self,
        timestamp: u64,
        pending: impl IntoIterator<Item = PendingEvent>,
    ) -> Vec<EventRecord> {
        let start = self.records.len();
        for PendingEvent { emitter, event } in pending {
            let id = self.next_id();
            self.records.push(EventRecord {
                id,
                emitter,
                timestamp,
                event,
            });
        }
        self.records[start..].to_vec()
    }

    /// Id the next appended record will receive
    pub fn next_id(&self) -> u64 {
        self.records.len() as u64 + 1
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `id > after`, for incremental consumers
    pub fn since(&self, after: u64) -> &[EventRecord] {
        let start = (after as usize).min(self.records.len());
        &self.records[start..]
    }

    /// Records emitted by one contract
    pub fn by_emitter<'a>(&'a self, emitter: &'a Address) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.records.iter().filter(move |r| &r.emitter == emitter)
    }

    /// Records the given address took part in
    pub fn for_user<'a>(&'a self, user: &'a Address) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.records.iter().filter(move |r| r.event.involves(user))
    }

    /// Records of one variant, by name (e.g. `"OrderFilled"`)
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.records.iter().filter(move |r| r.event.name() == name)
    }

    /// Iterate the bare events in order
    pub fn events(&self) -> impl Iterator<Item = &DomainEvent> {
        self.records.iter().map(|r| &r.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::EventSink;
    use gcdex_core::TokenAmount;

    fn transfer(to: &str) -> DomainEvent {
        DomainEvent::Transfer {
            from: Address::from_label("deployer"),
            to: Address::from_label(to),
            value: TokenAmount::tokens(1),
        }
    }

    #[test]
    fn test_ids_are_sequential_across_batches() {
        let token = Address::from_label("token");
        let mut log = EventLog::new();

        let mut first: Vec<PendingEvent> = Vec::new();
        first.emit(token, transfer("a"));
        first.emit(token, transfer("b"));
        let committed = log.append(100, first);
        assert_eq!(committed.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let mut second: Vec<PendingEvent> = Vec::new();
        second.emit(token, transfer("c"));
        let committed = log.append(101, second);
        assert_eq!(committed[0].id, 3);
        assert_eq!(committed[0].timestamp, 101);
        assert_eq!(log.len(), 3);
        assert_eq!(log.next_id(), 4);
    }

    #[test]
    fn test_since_and_filters() {
        let token = Address::from_label("token");
        let other = Address::from_label("other");
        let mut log = EventLog::new();
        let mut batch: Vec<PendingEvent> = Vec::new();
        batch.emit(token, transfer("a"));
        batch.emit(other, transfer("b"));
        log.append(1, batch);

        assert_eq!(log.since(1).len(), 1);
        assert_eq!(log.since(1)[0].id, 2);
        assert!(log.since(10).is_empty());
        assert_eq!(log.by_emitter(&token).count(), 1);
        assert_eq!(log.for_user(&Address::from_label("b")).count(), 1);
        assert_eq!(log.named("Transfer").count(), 2);
        assert_eq!(log.named("Deposit").count(), 0);
    }
}
