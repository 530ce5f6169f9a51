//! Event subscriber trait for async event handling

use crate::error::BusError;
use async_trait::async_trait;
use gcdex_events::EventRecord;

/// Trait for event subscribers
///
/// Records arrive in id order. Subscribers should tolerate seeing a
/// record twice (a replay after a live delivery).
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Subscriber name, for logging
    fn name(&self) -> &str;

    /// Handle one committed record
    async fn handle(&self, record: &EventRecord) -> Result<(), BusError>;

    /// Called before a full replay
    async fn on_replay_start(&self) -> Result<(), BusError> {
        Ok(())
    }

    /// Called after a full replay
    async fn on_replay_complete(&self) -> Result<(), BusError> {
        Ok(())
    }
}
