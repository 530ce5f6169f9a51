//! A single fixed-supply token ledger

use crate::error::TokenError;
use gcdex_core::{Address, TokenAmount, DEFAULT_DECIMALS};
use gcdex_events::{DomainEvent, EventSink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Deployment parameters, immutable once the token exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    /// Supply in whole tokens, minted to the deployer
    pub initial_supply: u64,
}

fn default_decimals() -> u32 {
    DEFAULT_DECIMALS
}

impl TokenConfig {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, initial_supply: u64) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: DEFAULT_DECIMALS,
            initial_supply,
        }
    }
}

/// A deployed token.
///
/// # Invariants
/// - The sum of all balances equals `total_supply` at all times.
/// - No balance or allowance is ever negative; all arithmetic is checked.
/// - A rejected operation changes nothing and emits nothing.
#[derive(Debug, Clone)]
pub struct Token {
    address: Address,
    name: String,
    symbol: String,
    decimals: u32,
    total_supply: TokenAmount,
    balances: HashMap<Address, TokenAmount>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), TokenAmount>,
}

impl Token {
    /// Deploy a token at `address`, minting the whole supply to `deployer`.
    pub fn deploy(address: Address, config: TokenConfig, deployer: Address) -> Result<Self, TokenError> {
        let total_supply = TokenAmount::whole(u128::from(config.initial_supply), config.decimals)
            .map_err(|_| TokenError::Overflow("initial supply"))?;

        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);

        tracing::debug!(
            token = %address,
            symbol = %config.symbol,
            supply = %total_supply,
            "Token deployed"
        );

        Ok(Self {
            address,
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            total_supply,
            balances,
            allowances: HashMap::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Balance of `owner` (zero if never seen)
    pub fn balance_of(&self, owner: &Address) -> TokenAmount {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    /// Remaining amount `spender` may move on behalf of `owner`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> TokenAmount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of every balance; equals `total_supply` while the invariant holds
    pub fn circulating(&self) -> Option<TokenAmount> {
        self.balances
            .values()
            .try_fold(TokenAmount::ZERO, |acc, b| acc.checked_add(b))
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        let (debited, credited) = self.plan_transfer(&from, &to, amount)?;
        self.commit_transfer(from, to, debited, credited);

        tracing::debug!(token = %self.symbol, %from, %to, %amount, "Transfer");
        sink.emit(self.address, DomainEvent::Transfer { from, to, value: amount });
        Ok(())
    }

    /// Set (overwrite) the allowance of `spender` over `owner`'s balance.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        if spender.is_zero() {
            return Err(TokenError::InvalidSpender);
        }

        self.allowances.insert((owner, spender), amount);

        tracing::debug!(token = %self.symbol, %owner, %spender, %amount, "Approval");
        sink.emit(
            self.address,
            DomainEvent::Approval {
                owner,
                spender,
                value: amount,
            },
        );
        Ok(())
    }

    /// Delegated transfer: `spender` moves `amount` from `owner` to `to`,
    /// consuming exactly `amount` of allowance.
    ///
    /// Emits a single `Transfer` event; the allowance change is not announced.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(&owner, &spender);
        let remaining = allowed
            .checked_sub(&amount)
            .ok_or(TokenError::InsufficientAllowance {
                owner,
                spender,
                available: allowed,
                required: amount,
            })?;

        let (debited, credited) = self.plan_transfer(&owner, &to, amount)?;

        self.allowances.insert((owner, spender), remaining);
        self.commit_transfer(owner, to, debited, credited);

        tracing::debug!(token = %self.symbol, %spender, from = %owner, %to, %amount, "Delegated transfer");
        sink.emit(
            self.address,
            DomainEvent::Transfer {
                from: owner,
                to,
                value: amount,
            },
        );
        Ok(())
    }

    /// Check a transfer and compute the resulting balances without mutating.
    fn plan_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: TokenAmount,
    ) -> Result<(TokenAmount, TokenAmount), TokenError> {
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(&amount)
            .ok_or(TokenError::InsufficientBalance {
                account: *from,
                available,
                required: amount,
            })?;

        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }

        // Self-transfer: credit applies to the already-debited balance
        let base = if from == to { debited } else { self.balance_of(to) };
        let credited = base
            .checked_add(&amount)
            .ok_or(TokenError::Overflow("recipient balance"))?;

        Ok((debited, credited))
    }

    fn commit_transfer(&mut self, from: Address, to: Address, debited: TokenAmount, credited: TokenAmount) {
        self.balances.insert(from, debited);
        self.balances.insert(to, credited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcdex_events::PendingEvent;

    fn tokens(n: u64) -> TokenAmount {
        TokenAmount::tokens(n)
    }

    fn deploy() -> (Token, Address) {
        let deployer = Address::from_label("deployer");
        let token = Token::deploy(
            Address::from_label("gc"),
            TokenConfig::new("Graham Coin", "GC", 1_000_000),
            deployer,
        )
        .unwrap();
        (token, deployer)
    }

    #[test]
    fn test_deployment_metadata() {
        let (token, deployer) = deploy();
        assert_eq!(token.name(), "Graham Coin");
        assert_eq!(token.symbol(), "GC");
        assert_eq!(token.decimals(), 18);
        assert_eq!(token.total_supply(), tokens(1_000_000));
        assert_eq!(token.balance_of(&deployer), tokens(1_000_000));
    }

    #[test]
    fn test_transfer_moves_balance_and_emits_event() {
        let (mut token, deployer) = deploy();
        let receiver = Address::from_label("receiver");
        let mut events: Vec<PendingEvent> = Vec::new();

        token.transfer(deployer, receiver, tokens(100), &mut events).unwrap();

        assert_eq!(token.balance_of(&receiver), tokens(100));
        assert_eq!(token.balance_of(&deployer), tokens(999_900));
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].event,
            DomainEvent::Transfer {
                from: deployer,
                to: receiver,
                value: tokens(100),
            }
        );
        assert_eq!(events[0].emitter, token.address());
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let (mut token, deployer) = deploy();
        let mut events: Vec<PendingEvent> = Vec::new();

        let result = token.transfer(deployer, Address::from_label("x"), tokens(100_000_000), &mut events);

        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(token.balance_of(&deployer), tokens(1_000_000));
        assert!(events.is_empty());
    }

    #[test]
    fn test_transfer_to_null_address_rejected() {
        let (mut token, deployer) = deploy();
        let mut events: Vec<PendingEvent> = Vec::new();

        let result = token.transfer(deployer, Address::ZERO, tokens(1), &mut events);

        assert_eq!(result, Err(TokenError::InvalidRecipient));
        assert_eq!(token.balance_of(&deployer), tokens(1_000_000));
        assert!(events.is_empty());
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let (mut token, deployer) = deploy();
        let mut events: Vec<PendingEvent> = Vec::new();

        token.transfer(deployer, deployer, tokens(5), &mut events).unwrap();

        assert_eq!(token.balance_of(&deployer), tokens(1_000_000));
        assert_eq!(token.circulating(), Some(token.total_supply()));
    }

    #[test]
    fn test_approve_overwrites() {
        let (mut token, deployer) = deploy();
        let spender = Address::from_label("exchange");
        let mut events: Vec<PendingEvent> = Vec::new();

        token.approve(deployer, spender, tokens(100), &mut events).unwrap();
        token.approve(deployer, spender, tokens(40), &mut events).unwrap();

        assert_eq!(token.allowance(&deployer, &spender), tokens(40));
        assert_eq!(
            events[1].event,
            DomainEvent::Approval {
                owner: deployer,
                spender,
                value: tokens(40),
            }
        );
    }

    #[test]
    fn test_approve_null_spender_rejected() {
        let (mut token, deployer) = deploy();
        let mut events: Vec<PendingEvent> = Vec::new();

        let result = token.approve(deployer, Address::ZERO, tokens(1), &mut events);

        assert_eq!(result, Err(TokenError::InvalidSpender));
        assert!(events.is_empty());
    }

    #[test]
    fn test_transfer_from_consumes_allowance_exactly() {
        let (mut token, owner) = deploy();
        let spender = Address::from_label("exchange");
        let to = Address::from_label("receiver");
        let mut events: Vec<PendingEvent> = Vec::new();

        token.approve(owner, spender, tokens(100), &mut events).unwrap();
        token.transfer_from(spender, owner, to, tokens(100), &mut events).unwrap();

        assert_eq!(token.allowance(&owner, &spender), TokenAmount::ZERO);
        assert_eq!(token.balance_of(&to), tokens(100));
        // Approval + Transfer, no extra allowance event
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event.name(), "Transfer");

        let result = token.transfer_from(spender, owner, to, TokenAmount::new(1), &mut events);
        assert!(matches!(result, Err(TokenError::InsufficientAllowance { .. })));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_transfer_from_partial_allowance() {
        let (mut token, owner) = deploy();
        let spender = Address::from_label("exchange");
        let mut events: Vec<PendingEvent> = Vec::new();

        token.approve(owner, spender, tokens(100), &mut events).unwrap();
        token.transfer_from(spender, owner, spender, tokens(30), &mut events).unwrap();

        assert_eq!(token.allowance(&owner, &spender), tokens(70));
        assert_eq!(token.balance_of(&spender), tokens(30));
    }

    #[test]
    fn test_transfer_from_insufficient_balance_keeps_allowance() {
        let (mut token, deployer) = deploy();
        let poor = Address::from_label("poor");
        let spender = Address::from_label("exchange");
        let mut events: Vec<PendingEvent> = Vec::new();

        token.transfer(deployer, poor, tokens(10), &mut events).unwrap();
        token.approve(poor, spender, tokens(50), &mut events).unwrap();
        let before = events.len();

        let result = token.transfer_from(spender, poor, spender, tokens(20), &mut events);

        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance { available, .. }) if available == tokens(10)
        ));
        assert_eq!(token.allowance(&poor, &spender), tokens(50));
        assert_eq!(token.balance_of(&poor), tokens(10));
        assert_eq!(events.len(), before);
    }

    #[test]
    fn test_supply_overflow_rejected() {
        let config = TokenConfig {
            name: "Huge".into(),
            symbol: "HUGE".into(),
            decimals: 30,
            initial_supply: u64::MAX,
        };
        let result = Token::deploy(Address::from_label("huge"), config, Address::from_label("d"));
        assert!(matches!(result, Err(TokenError::Overflow(_))));
    }

    #[test]
    fn test_config_default_decimals() {
        let config: TokenConfig =
            serde_json::from_str(r#"{"name":"mETH","symbol":"mETH","initial_supply":1000000}"#).unwrap();
        assert_eq!(config.decimals, 18);
    }
}
