//! Exchange deployment parameters

use gcdex_core::Address;
use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

/// Highest fee percent an exchange accepts
pub const MAX_FEE_PERCENT: u8 = 100;

/// Fixed at deployment, immutable afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Account credited with every fill fee
    pub fee_account: Address,
    /// Fee charged to the filler, as a whole percent of `amount_get`
    pub fee_percent: u8,
}

impl ExchangeConfig {
    pub fn new(fee_account: Address, fee_percent: u8) -> Self {
        Self {
            fee_account,
            fee_percent,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.fee_percent > MAX_FEE_PERCENT {
            return Err(ExchangeError::InvalidFeePercent(self.fee_percent));
        }
        Ok(())
    }
}
