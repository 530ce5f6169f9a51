//! The token-ledger capability the exchange depends on

use gcdex_core::{Address, TokenAmount};
use gcdex_events::EventSink;
use gcdex_token::{TokenError, TokenRegistry};

/// Transfers against arbitrary registered tokens.
///
/// Deposits pull through `transfer_from` with the exchange as spender;
/// withdrawals push with a direct `transfer` from the exchange.
pub trait TokenLedger {
    fn transfer(
        &mut self,
        token: &Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError>;

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: Address,
        owner: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError>;
}

impl TokenLedger for TokenRegistry {
    fn transfer(
        &mut self,
        token: &Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        TokenRegistry::transfer(self, token, from, to, amount, sink)
    }

    fn transfer_from(
        &mut self,
        token: &Address,
        spender: Address,
        owner: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        TokenRegistry::transfer_from(self, token, spender, owner, to, amount, sink)
    }
}
