//! GCDEX Core - Domain types
//!
//! This crate contains the fundamental types shared by the token ledger
//! and the exchange engine:
//! - `Address`: 20-byte account / contract identifier
//! - `TokenAmount`: Unsigned amount in a token's smallest unit
//! - `CallContext`: Sender and timestamp of the current transaction

pub mod address;
pub mod amount;
pub mod context;

pub use address::{Address, AddressError};
pub use amount::{AmountError, TokenAmount, DEFAULT_DECIMALS};
pub use context::CallContext;
