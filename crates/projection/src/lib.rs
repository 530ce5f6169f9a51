//! GCDEX Projection - Event log to SQLite views
//!
//! Projections are DISPOSABLE - they can be rebuilt from the event log
//! at any time and never feed back into contract state.

pub mod book;
pub mod engine;
pub mod error;
pub mod event;
pub mod order;

pub use book::{DecoratedOrder, OrderBook, OrderSide, PriceTrend, TokenPair, TradeView, PRICE_DECIMALS};
pub use engine::ProjectionEngine;
pub use error::ProjectionError;
pub use event::EventProjection;
pub use order::{OrderProjection, OrderView};
