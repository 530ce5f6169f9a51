//! Broadcast channel and ordered dispatch

use crate::error::BusError;
use crate::subscriber::EventSubscriber;
use gcdex_events::EventRecord;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Records buffered per live receiver before it starts lagging
pub const DEFAULT_CAPACITY: usize = 1024;

/// Event bus for distributing committed events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventRecord>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast one record to live receivers.
    ///
    /// Returns how many receivers got it; zero when nobody listens.
    pub fn publish(&self, record: &EventRecord) -> usize {
        self.sender.send(record.clone()).unwrap_or(0)
    }

    /// Open a live receiver; it sees only records published afterwards
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Wait for the next live record
    pub async fn recv(receiver: &mut broadcast::Receiver<EventRecord>) -> Result<EventRecord, BusError> {
        receiver.recv().await.map_err(|e| match e {
            RecvError::Closed => BusError::ChannelClosed,
            RecvError::Lagged(n) => BusError::Lagged(n),
        })
    }

    /// Feed an ordered batch to each subscriber, then broadcast it.
    ///
    /// Stops at the first subscriber failure.
    pub async fn dispatch(
        &self,
        records: &[EventRecord],
        subscribers: &[Arc<dyn EventSubscriber>],
    ) -> Result<(), BusError> {
        for subscriber in subscribers {
            for record in records {
                subscriber.handle(record).await?;
            }
        }
        for record in records {
            self.publish(record);
        }
        Ok(())
    }

    /// Rebuild subscribers from the complete log
    pub async fn replay(
        &self,
        records: &[EventRecord],
        subscribers: &[Arc<dyn EventSubscriber>],
    ) -> Result<(), BusError> {
        for subscriber in subscribers {
            subscriber.on_replay_start().await?;
            for record in records {
                subscriber.handle(record).await?;
            }
            subscriber.on_replay_complete().await?;
            tracing::info!(subscriber = subscriber.name(), events = records.len(), "Replay complete");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gcdex_core::{Address, TokenAmount};
    use gcdex_events::DomainEvent;
    use std::sync::Mutex;

    fn record(id: u64) -> EventRecord {
        EventRecord {
            id,
            emitter: Address::from_label("gc"),
            timestamp: 1_700_000_000,
            event: DomainEvent::Transfer {
                from: Address::from_label("a"),
                to: Address::from_label("b"),
                value: TokenAmount::tokens(id),
            },
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
        replays: Mutex<u32>,
        fail_on: Option<u64>,
    }

    #[async_trait]
    impl EventSubscriber for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle(&self, record: &EventRecord) -> Result<(), BusError> {
            if self.fail_on == Some(record.id) {
                return Err(BusError::SubscriberFailed {
                    name: self.name().to_string(),
                    reason: format!("refused {}", record.id),
                });
            }
            self.seen.lock().unwrap().push(record.id);
            Ok(())
        }

        async fn on_replay_start(&self) -> Result<(), BusError> {
            self.seen.lock().unwrap().clear();
            *self.replays.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_without_receivers() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(&record(1)), 0);
    }

    #[tokio::test]
    async fn test_live_receiver_gets_records_in_order() -> anyhow::Result<()> {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.receiver_count(), 1);

        bus.dispatch(&[record(1), record(2)], &[]).await?;

        assert_eq!(EventBus::recv(&mut rx).await?.id, 1);
        assert_eq!(EventBus::recv(&mut rx).await?.id, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_lagging_receiver() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        bus.publish(&record(1));
        bus.publish(&record(2));

        assert!(matches!(EventBus::recv(&mut rx).await, Err(BusError::Lagged(1))));
    }

    #[tokio::test]
    async fn test_dispatch_feeds_subscribers() -> anyhow::Result<()> {
        let bus = EventBus::default();
        let recorder = Arc::new(Recorder::default());
        let subscribers: Vec<Arc<dyn EventSubscriber>> = vec![recorder.clone()];

        bus.dispatch(&[record(1), record(2)], &subscribers).await?;
        bus.dispatch(&[record(3)], &subscribers).await?;

        assert_eq!(*recorder.seen.lock().unwrap(), vec![1, 2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_dispatch_stops_on_failure() {
        let bus = EventBus::default();
        let recorder = Arc::new(Recorder {
            fail_on: Some(2),
            ..Recorder::default()
        });
        let subscribers: Vec<Arc<dyn EventSubscriber>> = vec![recorder.clone()];

        let result = bus.dispatch(&[record(1), record(2), record(3)], &subscribers).await;

        assert!(matches!(result, Err(BusError::SubscriberFailed { .. })));
        assert_eq!(*recorder.seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_replay_resets_subscriber() -> anyhow::Result<()> {
        let bus = EventBus::default();
        let recorder = Arc::new(Recorder::default());
        let subscribers: Vec<Arc<dyn EventSubscriber>> = vec![recorder.clone()];
        bus.dispatch(&[record(1)], &subscribers).await?;

        bus.replay(&[record(1), record(2)], &subscribers).await?;

        assert_eq!(*recorder.seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(*recorder.replays.lock().unwrap(), 1);
        Ok(())
    }
}
