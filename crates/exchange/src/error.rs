//! Exchange engine errors

use gcdex_core::{Address, TokenAmount};
use gcdex_token::TokenError;
use thiserror::Error;

use crate::order::{OrderId, OrderStatus};

/// Exchange engine errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    /// The underlying token ledger rejected a transfer
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Custodied balance too low
    #[error("Insufficient exchange balance of {token} for {user}: available {available}, required {required}")]
    InsufficientBalance {
        token: Address,
        user: Address,
        available: TokenAmount,
        required: TokenAmount,
    },

    /// Only the creator may cancel an order
    #[error("Order {id} was not created by {caller}")]
    NotOrderCreator { id: OrderId, caller: Address },

    /// Order is already filled or cancelled
    #[error("Order {id} is already closed ({status})")]
    OrderAlreadyClosed { id: OrderId, status: OrderStatus },

    /// No order with this id
    #[error("Unknown order id: {0}")]
    UnknownOrderId(OrderId),

    /// Fee percent outside 0..=100
    #[error("Invalid fee percent: {0}")]
    InvalidFeePercent(u8),

    /// Checked arithmetic failed
    #[error("Arithmetic overflow: {0}")]
    Overflow(&'static str),
}
