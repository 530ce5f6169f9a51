//! GCDEX Runtime - Executes transactions against the whole store
//!
//! A `Transaction` names a sender, a timestamp, and one `Call` on a
//! token or the exchange. `Runtime::execute` runs it with a private
//! event buffer; only a successful call appends its events to the log.
//!
//! Committed transactions are journaled as JSONL. Replaying the journal
//! into a fresh runtime rebuilds identical balances, orders and events.

pub mod config;
pub mod error;
pub mod journal;
pub mod runtime;
pub mod shared;
pub mod transaction;

pub use config::{DeployConfig, CONFIG_ENV};
pub use error::RuntimeError;
pub use journal::{Journal, JournalEntry};
pub use runtime::Runtime;
pub use shared::SharedRuntime;
pub use transaction::{Call, Receipt, Transaction};
