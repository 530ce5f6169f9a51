//! Projection engine - coordinates replay and updates

use crate::book::{DecoratedOrder, OrderBook, TokenPair, TradeView};
use crate::error::ProjectionError;
use crate::event::EventProjection;
use crate::order::{OrderProjection, OrderView};
use async_trait::async_trait;
use gcdex_bus::{BusError, EventSubscriber};
use gcdex_core::Address;
use gcdex_events::EventRecord;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Projection engine - coordinates replay and updates
pub struct ProjectionEngine {
    orders: OrderProjection,
    events: EventProjection,
}

impl ProjectionEngine {
    /// Open (or create) the projection database at `db_path`
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, ProjectionError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePool::connect(&db_url).await?;
        Self::with_pool(pool).await
    }

    /// A throwaway in-memory projection.
    ///
    /// Each SQLite connection gets its own memory database, so the pool
    /// is pinned to a single connection.
    pub async fn in_memory() -> Result<Self, ProjectionError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, ProjectionError> {
        let orders = OrderProjection::new(pool.clone());
        let events = EventProjection::new(pool);
        orders.init().await?;
        events.init().await?;
        Ok(Self { orders, events })
    }

    /// Apply a single committed record
    pub async fn apply(&self, record: &EventRecord) -> Result<(), ProjectionError> {
        self.orders.apply(record).await?;
        self.events.apply(record).await?;
        Ok(())
    }

    /// Clear every view and rebuild from the complete log
    pub async fn replay(&self, records: &[EventRecord]) -> Result<usize, ProjectionError> {
        self.clear().await?;
        for record in records {
            self.apply(record).await?;
        }
        tracing::debug!(events = records.len(), "Projection rebuilt");
        Ok(records.len())
    }

    pub async fn clear(&self) -> Result<(), ProjectionError> {
        self.orders.clear().await?;
        self.events.clear().await?;
        Ok(())
    }

    /// Highest event id applied
    pub async fn last_event_id(&self) -> Result<u64, ProjectionError> {
        self.events.last_event_id().await
    }

    pub fn orders(&self) -> &OrderProjection {
        &self.orders
    }

    pub fn events(&self) -> &EventProjection {
        &self.events
    }

    pub async fn all_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.orders.all_orders().await
    }

    pub async fn filled_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.orders.filled_orders().await
    }

    pub async fn cancelled_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.orders.cancelled_orders().await
    }

    pub async fn open_orders(&self) -> Result<Vec<OrderView>, ProjectionError> {
        self.orders.open_orders().await
    }

    pub async fn user_open_orders(&self, user: &Address) -> Result<Vec<OrderView>, ProjectionError> {
        self.orders.user_open_orders(user).await
    }

    pub async fn user_trades(&self, user: &Address) -> Result<Vec<OrderView>, ProjectionError> {
        self.orders.user_trades(user).await
    }

    pub async fn user_events(&self, user: &Address) -> Result<Vec<EventRecord>, ProjectionError> {
        self.events.user_events(user).await
    }

    /// Open orders of the `token0`/`token1` market
    pub async fn order_book(&self, token0: Address, token1: Address) -> Result<OrderBook, ProjectionError> {
        let open = self.orders.open_orders().await?;
        Ok(TokenPair::new(token0, token1).order_book(&open))
    }

    /// Filled orders of the `token0`/`token1` market, newest first
    pub async fn pair_trades(&self, token0: Address, token1: Address) -> Result<Vec<TradeView>, ProjectionError> {
        let filled = self.orders.filled_orders().await?;
        Ok(TokenPair::new(token0, token1).trades(&filled))
    }

    /// `user`'s trades in the `token0`/`token1` market, newest first
    pub async fn user_pair_trades(
        &self,
        token0: Address,
        token1: Address,
        user: &Address,
    ) -> Result<Vec<DecoratedOrder>, ProjectionError> {
        let filled = self.orders.user_trades(user).await?;
        Ok(TokenPair::new(token0, token1).user_trades(&filled, user))
    }
}

#[async_trait]
impl EventSubscriber for ProjectionEngine {
    fn name(&self) -> &str {
        "projection"
    }

    async fn handle(&self, record: &EventRecord) -> Result<(), BusError> {
        self.apply(record).await.map_err(|e| BusError::SubscriberFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })
    }

    async fn on_replay_start(&self) -> Result<(), BusError> {
        self.clear().await.map_err(|e| BusError::SubscriberFailed {
            name: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}
