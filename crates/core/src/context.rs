//! Call context - who is calling and when

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// The sender and block time of the transaction an operation runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub sender: Address,
    /// Unix seconds
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self { sender, timestamp }
    }
}
