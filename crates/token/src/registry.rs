//! Token registry - every deployed token by contract address

use crate::error::TokenError;
use crate::token::{Token, TokenConfig};
use gcdex_core::{Address, TokenAmount};
use gcdex_events::EventSink;
use std::collections::BTreeMap;

/// All deployed tokens.
///
/// Iteration is ordered by address so that anything derived from the
/// registry is deterministic across replays.
#[derive(Debug, Default, Clone)]
pub struct TokenRegistry {
    tokens: BTreeMap<Address, Token>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a new token at `address`
    pub fn deploy(
        &mut self,
        address: Address,
        config: TokenConfig,
        deployer: Address,
    ) -> Result<&Token, TokenError> {
        if self.tokens.contains_key(&address) {
            return Err(TokenError::AddressInUse(address));
        }
        let token = Token::deploy(address, config, deployer)?;
        let token = self.tokens.entry(address).or_insert(token);
        Ok(&*token)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Result<&Token, TokenError> {
        self.tokens
            .get(address)
            .ok_or(TokenError::UnknownToken(*address))
    }

    pub fn get_mut(&mut self, address: &Address) -> Result<&mut Token, TokenError> {
        self.tokens
            .get_mut(address)
            .ok_or(TokenError::UnknownToken(*address))
    }

    /// Look a token up by symbol (case-insensitive)
    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .values()
            .find(|t| t.symbol().eq_ignore_ascii_case(symbol))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Balance of `owner` on `token`
    pub fn balance_of(&self, token: &Address, owner: &Address) -> Result<TokenAmount, TokenError> {
        Ok(self.get(token)?.balance_of(owner))
    }

    /// Dispatch a direct transfer to `token`
    pub fn transfer(
        &mut self,
        token: &Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.transfer(from, to, amount, sink)
    }

    /// Dispatch an approval to `token`
    pub fn approve(
        &mut self,
        token: &Address,
        owner: Address,
        spender: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?.approve(owner, spender, amount, sink)
    }

    /// Dispatch a delegated transfer to `token`
    pub fn transfer_from(
        &mut self,
        token: &Address,
        spender: Address,
        owner: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        self.get_mut(token)?
            .transfer_from(spender, owner, to, amount, sink)
    }
}
