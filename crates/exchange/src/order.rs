//! Order types

use gcdex_core::{Address, TokenAmount};
use gcdex_events::DomainEvent;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Sequential order identifier, starting at 1
pub type OrderId = u64;

/// Order lifecycle: `Open → Filled | Cancelled`.
///
/// Both closed states are terminal and mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    /// Waiting for a filler
    Open,
    /// Settled by a single fill
    Filled,
    /// Withdrawn by its creator
    Cancelled,
}

/// A standing offer: the creator gives `amount_give` of `token_give`
/// in exchange for `amount_get` of `token_get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Creator
    pub user: Address,
    pub token_get: Address,
    pub amount_get: TokenAmount,
    pub token_give: Address,
    pub amount_give: TokenAmount,
    /// Unix seconds of the creating transaction
    pub timestamp: u64,
    pub status: OrderStatus,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    pub(crate) fn created_event(&self) -> DomainEvent {
        DomainEvent::OrderCreated {
            id: self.id,
            user: self.user,
            token_get: self.token_get,
            amount_get: self.amount_get,
            token_give: self.token_give,
            amount_give: self.amount_give,
            timestamp: self.timestamp,
        }
    }

    pub(crate) fn cancelled_event(&self, timestamp: u64) -> DomainEvent {
        DomainEvent::OrderCancelled {
            id: self.id,
            user: self.user,
            token_get: self.token_get,
            amount_get: self.amount_get,
            token_give: self.token_give,
            amount_give: self.amount_give,
            timestamp,
        }
    }

    pub(crate) fn filled_event(&self, filler: Address, fee: TokenAmount, timestamp: u64) -> DomainEvent {
        DomainEvent::OrderFilled {
            id: self.id,
            user: filler,
            token_get: self.token_get,
            amount_get: self.amount_get,
            token_give: self.token_give,
            amount_give: self.amount_give,
            creator: self.user,
            fee,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_strings() {
        assert_eq!(OrderStatus::Open.to_string(), "open");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(OrderStatus::from_str("filled").unwrap(), OrderStatus::Filled);
        assert!(OrderStatus::from_str("partially_filled").is_err());
    }

    #[test]
    fn test_filled_event_names_both_parties() {
        let creator = Address::from_label("user1");
        let filler = Address::from_label("user2");
        let order = Order {
            id: 3,
            user: creator,
            token_get: Address::from_label("meth"),
            amount_get: TokenAmount::tokens(1),
            token_give: Address::from_label("gc"),
            amount_give: TokenAmount::tokens(10),
            timestamp: 100,
            status: OrderStatus::Open,
        };

        match order.filled_event(filler, TokenAmount::ZERO, 200) {
            DomainEvent::OrderFilled {
                user,
                creator: c,
                timestamp,
                ..
            } => {
                assert_eq!(user, filler);
                assert_eq!(c, creator);
                assert_eq!(timestamp, 200);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
