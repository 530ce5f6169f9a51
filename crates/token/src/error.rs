//! Token ledger errors

use gcdex_core::{Address, TokenAmount};
use thiserror::Error;

/// Errors that can occur in token operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance for {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Insufficient allowance for {spender} on {owner}: available {available}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    #[error("Recipient cannot be the null address")]
    InvalidRecipient,

    #[error("Spender cannot be the null address")]
    InvalidSpender,

    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("Address already in use: {0}")]
    AddressInUse(Address),

    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),
}
