//! Runtime errors

use gcdex_core::Address;
use gcdex_events::EventError;
use gcdex_exchange::ExchangeError;
use gcdex_token::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Exchange has not been deployed")]
    ExchangeNotDeployed,

    #[error("Exchange already deployed at {0}")]
    ExchangeAlreadyDeployed(Address),

    #[error("Journal error: {0}")]
    Journal(#[from] EventError),

    #[error("Replay diverged at journal entry {sequence}: {reason}")]
    Replay { sequence: u64, reason: String },

    #[error("Invalid config {path}: {reason}")]
    Config { path: String, reason: String },
}

impl RuntimeError {
    /// True if the transaction was rejected by a contract rule, as
    /// opposed to an I/O or setup failure
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RuntimeError::Token(_)
                | RuntimeError::Exchange(_)
                | RuntimeError::ExchangeNotDeployed
                | RuntimeError::ExchangeAlreadyDeployed(_)
        )
    }
}
