//! GCDEX Token Ledger - Fixed-supply fungible tokens
//!
//! Every balance change on a token goes through this crate.
//!
//! # Key Types
//! - `Token`: One deployed token: balances, allowances, transfer, delegated transfer
//! - `TokenConfig`: Name, symbol, decimals and initial supply fixed at deployment
//! - `TokenRegistry`: All deployed tokens, addressed by contract address
//! - `TokenError`: Rejections; none of them leave a partial effect

pub mod error;
pub mod registry;
pub mod token;

pub use error::TokenError;
pub use registry::TokenRegistry;
pub use token::{Token, TokenConfig};
