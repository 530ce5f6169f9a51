//! GCDEX Exchange Engine
//!
//! Custodies tokens per (token, user) and settles discrete orders.
//! Orders are matched only by an explicit `fill_order` against a
//! specific id; there is no automatic crossing. A fill is one atomic
//! unit of five balance mutations (four legs plus the fee credit)
//! that either fully applies or leaves every balance untouched.

mod config;
mod engine;
mod error;
mod ledger;
mod order;

pub use config::{ExchangeConfig, MAX_FEE_PERCENT};
pub use engine::{Exchange, Fill};
pub use error::ExchangeError;
pub use ledger::TokenLedger;
pub use order::{Order, OrderId, OrderStatus};
