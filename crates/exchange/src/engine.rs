//! Exchange engine - custody, order lifecycle, fills

use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::ledger::TokenLedger;
use crate::order::{Order, OrderId, OrderStatus};
use gcdex_core::{Address, CallContext, TokenAmount};
use gcdex_events::{DomainEvent, EventSink};
use std::collections::{BTreeMap, HashMap};

/// Outcome of a successful fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// The order, now `Filled`
    pub order: Order,
    pub filler: Address,
    /// Charged to the filler in `token_get`
    pub fee: TokenAmount,
}

/// The exchange contract.
///
/// Balances are keyed by `(token, user)`. For every token the sum of
/// custodied balances equals the exchange address's balance on that
/// token's ledger.
#[derive(Debug, Clone)]
pub struct Exchange {
    address: Address,
    config: ExchangeConfig,
    balances: HashMap<(Address, Address), TokenAmount>,
    orders: BTreeMap<OrderId, Order>,
    order_count: u64,
}

impl Exchange {
    /// Deploy an exchange at `address`
    pub fn new(address: Address, config: ExchangeConfig) -> Result<Self, ExchangeError> {
        config.validate()?;
        Ok(Self {
            address,
            config,
            balances: HashMap::new(),
            orders: BTreeMap::new(),
            order_count: 0,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn fee_account(&self) -> Address {
        self.config.fee_account
    }

    pub fn fee_percent(&self) -> u8 {
        self.config.fee_percent
    }

    /// Custodied balance of `user` in `token`
    pub fn balance_of(&self, token: &Address, user: &Address) -> TokenAmount {
        self.balances
            .get(&(*token, *user))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of every custodied balance in `token`
    pub fn custodied_total(&self, token: &Address) -> Option<TokenAmount> {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .try_fold(TokenAmount::ZERO, |acc, (_, b)| acc.checked_add(b))
    }

    /// Fee charged to whoever fills an order asking for `amount_get`
    pub fn fee_for(&self, amount_get: TokenAmount) -> Result<TokenAmount, ExchangeError> {
        amount_get
            .percent(self.config.fee_percent)
            .ok_or(ExchangeError::Overflow("fee"))
    }

    /// Pull `amount` of `token` from the caller into custody.
    ///
    /// The caller must have approved the exchange on `token` first.
    pub fn deposit_token(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        token: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<TokenAmount, ExchangeError> {
        let user = ctx.sender;
        let balance = self
            .balance_of(&token, &user)
            .checked_add(&amount)
            .ok_or(ExchangeError::Overflow("custodied balance"))?;

        ledger.transfer_from(&token, self.address, user, self.address, amount, sink)?;
        self.balances.insert((token, user), balance);

        tracing::debug!(%token, %user, %amount, %balance, "Deposit");
        sink.emit(
            self.address,
            DomainEvent::Deposit {
                token,
                user,
                amount,
                balance,
            },
        );
        Ok(balance)
    }

    /// Return `amount` of `token` from custody to the caller.
    pub fn withdraw_token(
        &mut self,
        ctx: &CallContext,
        ledger: &mut dyn TokenLedger,
        token: Address,
        amount: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<TokenAmount, ExchangeError> {
        let user = ctx.sender;
        let available = self.balance_of(&token, &user);
        let balance = available
            .checked_sub(&amount)
            .ok_or(ExchangeError::InsufficientBalance {
                token,
                user,
                available,
                required: amount,
            })?;

        ledger.transfer(&token, self.address, user, amount, sink)?;
        self.balances.insert((token, user), balance);

        tracing::debug!(%token, %user, %amount, %balance, "Withdraw");
        sink.emit(
            self.address,
            DomainEvent::Withdraw {
                token,
                user,
                amount,
                balance,
            },
        );
        Ok(balance)
    }

    /// Record a new open order for the caller.
    ///
    /// Nothing is reserved: the creator's `token_give` balance is only
    /// checked when the order is filled.
    pub fn make_order(
        &mut self,
        ctx: &CallContext,
        token_get: Address,
        amount_get: TokenAmount,
        token_give: Address,
        amount_give: TokenAmount,
        sink: &mut dyn EventSink,
    ) -> Result<OrderId, ExchangeError> {
        let id = self
            .order_count
            .checked_add(1)
            .ok_or(ExchangeError::Overflow("order id"))?;

        let order = Order {
            id,
            user: ctx.sender,
            token_get,
            amount_get,
            token_give,
            amount_give,
            timestamp: ctx.timestamp,
            status: OrderStatus::Open,
        };
        let event = order.created_event();

        self.order_count = id;
        self.orders.insert(id, order);

        tracing::debug!(id, user = %ctx.sender, "Order created");
        sink.emit(self.address, event);
        Ok(id)
    }

    /// Cancel one of the caller's open orders
    pub fn cancel_order(
        &mut self,
        ctx: &CallContext,
        id: OrderId,
        sink: &mut dyn EventSink,
    ) -> Result<(), ExchangeError> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or(ExchangeError::UnknownOrderId(id))?;

        if order.user != ctx.sender {
            return Err(ExchangeError::NotOrderCreator {
                id,
                caller: ctx.sender,
            });
        }
        if !order.is_open() {
            return Err(ExchangeError::OrderAlreadyClosed {
                id,
                status: order.status,
            });
        }

        order.status = OrderStatus::Cancelled;
        let event = order.cancelled_event(ctx.timestamp);

        tracing::debug!(id, user = %ctx.sender, "Order cancelled");
        sink.emit(self.address, event);
        Ok(())
    }

    /// Fill an open order in full.
    ///
    /// The caller pays `amount_get + fee` of `token_get` and receives
    /// `amount_give` of `token_give`. All five balance changes are
    /// computed before any is written, so a failure leaves every balance
    /// and the order untouched.
    pub fn fill_order(
        &mut self,
        ctx: &CallContext,
        id: OrderId,
        sink: &mut dyn EventSink,
    ) -> Result<Fill, ExchangeError> {
        let order = self.orders.get(&id).ok_or(ExchangeError::UnknownOrderId(id))?;
        if !order.is_open() {
            return Err(ExchangeError::OrderAlreadyClosed {
                id,
                status: order.status,
            });
        }

        let filler = ctx.sender;
        let creator = order.user;
        let fee = self.fee_for(order.amount_get)?;
        let debit = order
            .amount_get
            .checked_add(&fee)
            .ok_or(ExchangeError::Overflow("fill amount"))?;

        // Both payers must cover their leg from balances held before the fill
        self.require(order.token_get, filler, debit)?;
        self.require(order.token_give, creator, order.amount_give)?;

        let mut staged = Staged::new(self);
        staged.debit(order.token_get, filler, debit)?;
        staged.credit(order.token_get, creator, order.amount_get)?;
        staged.credit(order.token_get, self.config.fee_account, fee)?;
        staged.debit(order.token_give, creator, order.amount_give)?;
        staged.credit(order.token_give, filler, order.amount_give)?;
        let updates = staged.into_updates();

        self.balances.extend(updates);
        let order = match self.orders.get_mut(&id) {
            Some(order) => order,
            None => return Err(ExchangeError::UnknownOrderId(id)),
        };
        order.status = OrderStatus::Filled;
        let event = order.filled_event(filler, fee, ctx.timestamp);
        let order = order.clone();

        tracing::debug!(id, %filler, %creator, %fee, "Order filled");
        sink.emit(self.address, event);
        Ok(Fill { order, filler, fee })
    }

    fn require(&self, token: Address, user: Address, required: TokenAmount) -> Result<(), ExchangeError> {
        let available = self.balance_of(&token, &user);
        if available < required {
            return Err(ExchangeError::InsufficientBalance {
                token,
                user,
                available,
                required,
            });
        }
        Ok(())
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Every order ever created, by id
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Number of orders created; also the id of the latest one
    pub fn order_count(&self) -> u64 {
        self.order_count
    }
}

/// Balance changes of one fill, applied in order against a scratch copy
/// of the touched entries.
///
/// Entries can alias (self-fill, `token_get == token_give`, fee account
/// as filler), so each leg reads the value left by the previous one.
struct Staged<'a> {
    exchange: &'a Exchange,
    entries: HashMap<(Address, Address), TokenAmount>,
}

impl<'a> Staged<'a> {
    fn new(exchange: &'a Exchange) -> Self {
        Self {
            exchange,
            entries: HashMap::new(),
        }
    }

    fn current(&self, token: Address, user: Address) -> TokenAmount {
        self.entries
            .get(&(token, user))
            .copied()
            .unwrap_or_else(|| self.exchange.balance_of(&token, &user))
    }

    fn debit(&mut self, token: Address, user: Address, amount: TokenAmount) -> Result<(), ExchangeError> {
        let available = self.current(token, user);
        let next = available
            .checked_sub(&amount)
            .ok_or(ExchangeError::InsufficientBalance {
                token,
                user,
                available,
                required: amount,
            })?;
        self.entries.insert((token, user), next);
        Ok(())
    }

    fn credit(&mut self, token: Address, user: Address, amount: TokenAmount) -> Result<(), ExchangeError> {
        let next = self
            .current(token, user)
            .checked_add(&amount)
            .ok_or(ExchangeError::Overflow("custodied balance"))?;
        self.entries.insert((token, user), next);
        Ok(())
    }

    fn into_updates(self) -> HashMap<(Address, Address), TokenAmount> {
        self.entries
    }
}
