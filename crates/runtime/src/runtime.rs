//! Transaction execution

use crate::error::RuntimeError;
use crate::journal::JournalEntry;
use crate::transaction::{Call, Receipt, Transaction};
use gcdex_core::{Address, CallContext};
use gcdex_events::{EventLog, PendingEvent};
use gcdex_exchange::{Exchange, OrderId};
use gcdex_token::TokenRegistry;
use std::collections::HashMap;

/// The whole contract store: every token, the exchange, and the event log.
///
/// Each `execute` is one atomic unit. Contract operations check every
/// precondition before writing, and events are buffered per transaction,
/// so a rejected transaction leaves state and log untouched.
#[derive(Debug, Default, Clone)]
pub struct Runtime {
    tokens: TokenRegistry,
    exchange: Option<Exchange>,
    log: EventLog,
    /// Deployments made so far, per sender
    nonces: HashMap<Address, u64>,
    committed: u64,
}

/// What a call created, if anything
#[derive(Default)]
struct Outcome {
    contract: Option<Address>,
    order_id: Option<OrderId>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a runtime by re-executing journaled transactions in order
    pub fn replay<'a>(entries: impl IntoIterator<Item = &'a JournalEntry>) -> Result<Self, RuntimeError> {
        let mut runtime = Self::new();
        for entry in entries {
            runtime
                .execute(&entry.tx)
                .map_err(|e| RuntimeError::Replay {
                    sequence: entry.sequence,
                    reason: e.to_string(),
                })?;
        }
        tracing::info!(
            transactions = runtime.committed,
            events = runtime.log.len(),
            "Replayed journal"
        );
        Ok(runtime)
    }

    /// Execute one transaction
    pub fn execute(&mut self, tx: &Transaction) -> Result<Receipt, RuntimeError> {
        let mut pending: Vec<PendingEvent> = Vec::new();

        let outcome = match self.dispatch(tx, &mut pending) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(sender = %tx.sender, method = tx.call.method(), error = %e, "Transaction rejected");
                return Err(e);
            }
        };

        self.committed += 1;
        let events = self.log.append(tx.timestamp, pending);

        tracing::info!(
            index = self.committed,
            sender = %tx.sender,
            method = tx.call.method(),
            events = events.len(),
            "Transaction committed"
        );

        Ok(Receipt {
            index: self.committed,
            contract: outcome.contract,
            order_id: outcome.order_id,
            events,
        })
    }

    fn dispatch(&mut self, tx: &Transaction, sink: &mut Vec<PendingEvent>) -> Result<Outcome, RuntimeError> {
        let ctx = CallContext::new(tx.sender, tx.timestamp);
        let sender = tx.sender;

        match &tx.call {
            Call::DeployToken { config } => {
                let address = self.next_contract_address(&sender);
                self.tokens.deploy(address, config.clone(), sender)?;
                self.bump_nonce(sender);
                Ok(Outcome {
                    contract: Some(address),
                    ..Outcome::default()
                })
            }
            Call::DeployExchange { config } => {
                if let Some(exchange) = &self.exchange {
                    return Err(RuntimeError::ExchangeAlreadyDeployed(exchange.address()));
                }
                let address = self.next_contract_address(&sender);
                self.exchange = Some(Exchange::new(address, *config)?);
                self.bump_nonce(sender);
                Ok(Outcome {
                    contract: Some(address),
                    ..Outcome::default()
                })
            }
            Call::Transfer { token, to, amount } => {
                self.tokens.transfer(token, sender, *to, *amount, sink)?;
                Ok(Outcome::default())
            }
            Call::Approve {
                token,
                spender,
                amount,
            } => {
                self.tokens.approve(token, sender, *spender, *amount, sink)?;
                Ok(Outcome::default())
            }
            Call::TransferFrom {
                token,
                from,
                to,
                amount,
            } => {
                self.tokens
                    .transfer_from(token, sender, *from, *to, *amount, sink)?;
                Ok(Outcome::default())
            }
            Call::DepositToken { token, amount } => {
                let exchange = self.exchange.as_mut().ok_or(RuntimeError::ExchangeNotDeployed)?;
                exchange.deposit_token(&ctx, &mut self.tokens, *token, *amount, sink)?;
                Ok(Outcome::default())
            }
            Call::WithdrawToken { token, amount } => {
                let exchange = self.exchange.as_mut().ok_or(RuntimeError::ExchangeNotDeployed)?;
                exchange.withdraw_token(&ctx, &mut self.tokens, *token, *amount, sink)?;
                Ok(Outcome::default())
            }
            Call::MakeOrder {
                token_get,
                amount_get,
                token_give,
                amount_give,
            } => {
                let exchange = self.exchange_mut()?;
                let id = exchange.make_order(&ctx, *token_get, *amount_get, *token_give, *amount_give, sink)?;
                Ok(Outcome {
                    order_id: Some(id),
                    ..Outcome::default()
                })
            }
            Call::CancelOrder { id } => {
                self.exchange_mut()?.cancel_order(&ctx, *id, sink)?;
                Ok(Outcome {
                    order_id: Some(*id),
                    ..Outcome::default()
                })
            }
            Call::FillOrder { id } => {
                self.exchange_mut()?.fill_order(&ctx, *id, sink)?;
                Ok(Outcome {
                    order_id: Some(*id),
                    ..Outcome::default()
                })
            }
        }
    }

    fn next_contract_address(&self, deployer: &Address) -> Address {
        let nonce = self.nonces.get(deployer).copied().unwrap_or_default();
        Address::contract(deployer, nonce)
    }

    fn bump_nonce(&mut self, deployer: Address) {
        *self.nonces.entry(deployer).or_default() += 1;
    }

    fn exchange_mut(&mut self) -> Result<&mut Exchange, RuntimeError> {
        self.exchange.as_mut().ok_or(RuntimeError::ExchangeNotDeployed)
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn exchange(&self) -> Result<&Exchange, RuntimeError> {
        self.exchange.as_ref().ok_or(RuntimeError::ExchangeNotDeployed)
    }

    pub fn is_deployed(&self) -> bool {
        self.exchange.is_some()
    }

    /// Committed events, in order
    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Number of committed transactions
    pub fn committed(&self) -> u64 {
        self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcdex_core::TokenAmount;
    use gcdex_events::DomainEvent;
    use gcdex_exchange::{ExchangeConfig, ExchangeError};
    use gcdex_token::{TokenConfig, TokenError};

    const T0: u64 = 1_700_000_000;

    fn tx(sender: Address, call: Call) -> Transaction {
        Transaction::new(sender, T0, call)
    }

    fn deployed() -> (Runtime, Address, Address) {
        let deployer = Address::from_label("deployer");
        let mut runtime = Runtime::new();
        let gc = runtime
            .execute(&tx(
                deployer,
                Call::DeployToken {
                    config: TokenConfig::new("Graham Coin", "GC", 1_000_000),
                },
            ))
            .unwrap()
            .contract
            .unwrap();
        runtime
            .execute(&tx(
                deployer,
                Call::DeployExchange {
                    config: ExchangeConfig::new(Address::from_label("fee"), 10),
                },
            ))
            .unwrap();
        (runtime, deployer, gc)
    }

    #[test]
    fn test_deploy_addresses_follow_nonce() {
        let (runtime, deployer, gc) = deployed();
        assert_eq!(gc, Address::contract(&deployer, 0));
        assert_eq!(
            runtime.exchange().unwrap().address(),
            Address::contract(&deployer, 1)
        );
        // Deploys emit nothing
        assert!(runtime.events().is_empty());
        assert_eq!(runtime.committed(), 2);
    }

    #[test]
    fn test_second_exchange_rejected() {
        let (mut runtime, deployer, _) = deployed();
        let result = runtime.execute(&tx(
            deployer,
            Call::DeployExchange {
                config: ExchangeConfig::new(deployer, 1),
            },
        ));
        assert!(matches!(result, Err(RuntimeError::ExchangeAlreadyDeployed(_))));
        assert_eq!(runtime.committed(), 2);
    }

    #[test]
    fn test_exchange_calls_need_deployment() {
        let mut runtime = Runtime::new();
        let result = runtime.execute(&tx(Address::from_label("user1"), Call::FillOrder { id: 1 }));
        assert!(matches!(result, Err(RuntimeError::ExchangeNotDeployed)));
        assert!(result.unwrap_err().is_rejection());
    }

    #[test]
    fn test_transfer_receipt_carries_events() {
        let (mut runtime, deployer, gc) = deployed();
        let receiver = Address::from_label("user1");

        let receipt = runtime
            .execute(&tx(
                deployer,
                Call::Transfer {
                    token: gc,
                    to: receiver,
                    amount: TokenAmount::tokens(100),
                },
            ))
            .unwrap();

        assert_eq!(receipt.index, 3);
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(receipt.events[0].id, 1);
        assert_eq!(receipt.events[0].emitter, gc);
        assert_eq!(receipt.events[0].timestamp, T0);
        assert_eq!(
            receipt.events[0].event,
            DomainEvent::Transfer {
                from: deployer,
                to: receiver,
                value: TokenAmount::tokens(100),
            }
        );
    }

    #[test]
    fn test_rejected_transaction_appends_nothing() {
        let (mut runtime, _, gc) = deployed();
        let pauper = Address::from_label("pauper");

        let result = runtime.execute(&tx(
            pauper,
            Call::Transfer {
                token: gc,
                to: Address::from_label("user1"),
                amount: TokenAmount::tokens(1),
            },
        ));

        assert!(matches!(
            result,
            Err(RuntimeError::Token(TokenError::InsufficientBalance { .. }))
        ));
        assert!(runtime.events().is_empty());
        assert_eq!(runtime.committed(), 2);
    }

    #[test]
    fn test_make_order_receipt_has_id() {
        let (mut runtime, _, gc) = deployed();
        let user1 = Address::from_label("user1");

        let receipt = runtime
            .execute(&tx(
                user1,
                Call::MakeOrder {
                    token_get: gc,
                    amount_get: TokenAmount::tokens(1),
                    token_give: gc,
                    amount_give: TokenAmount::tokens(1),
                },
            ))
            .unwrap();

        assert_eq!(receipt.order_id, Some(1));
        assert_eq!(receipt.events[0].emitter, runtime.exchange().unwrap().address());

        let result = runtime.execute(&tx(Address::from_label("user2"), Call::CancelOrder { id: 1 }));
        assert!(matches!(
            result,
            Err(RuntimeError::Exchange(ExchangeError::NotOrderCreator { .. }))
        ));
    }
}
