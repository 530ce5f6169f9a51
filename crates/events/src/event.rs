//! Domain events emitted by the token ledger and the exchange

use gcdex_core::{Address, TokenAmount};
use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

/// Events emitted by contracts.
///
/// Serialized as `{"event": <name>, "args": {...}}` with camelCase field
/// names (`tokenGet`, `amountGive`, ...); downstream consumers key on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "event", content = "args", rename_all_fields = "camelCase")]
pub enum DomainEvent {
    /// Tokens moved on a token ledger
    Transfer {
        from: Address,
        to: Address,
        value: TokenAmount,
    },

    /// Allowance set on a token ledger
    Approval {
        owner: Address,
        spender: Address,
        value: TokenAmount,
    },

    /// Tokens moved into exchange custody
    Deposit {
        token: Address,
        user: Address,
        amount: TokenAmount,
        /// Custodied balance after the deposit
        balance: TokenAmount,
    },

    /// Tokens moved out of exchange custody
    Withdraw {
        token: Address,
        user: Address,
        amount: TokenAmount,
        /// Custodied balance after the withdrawal
        balance: TokenAmount,
    },

    OrderCreated {
        id: u64,
        user: Address,
        token_get: Address,
        amount_get: TokenAmount,
        token_give: Address,
        amount_give: TokenAmount,
        timestamp: u64,
    },

    OrderCancelled {
        id: u64,
        user: Address,
        token_get: Address,
        amount_get: TokenAmount,
        token_give: Address,
        amount_give: TokenAmount,
        timestamp: u64,
    },

    OrderFilled {
        id: u64,
        /// The filler
        user: Address,
        token_get: Address,
        amount_get: TokenAmount,
        token_give: Address,
        amount_give: TokenAmount,
        /// The order creator
        creator: Address,
        /// Fee charged to the filler, denominated in `token_get`
        fee: TokenAmount,
        timestamp: u64,
    },
}

impl DomainEvent {
    /// Variant name, e.g. `"OrderFilled"`
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// True if `address` acted in or was party to this event
    pub fn involves(&self, address: &Address) -> bool {
        match self {
            DomainEvent::Transfer { from, to, .. } => from == address || to == address,
            DomainEvent::Approval { owner, spender, .. } => owner == address || spender == address,
            DomainEvent::Deposit { user, .. }
            | DomainEvent::Withdraw { user, .. }
            | DomainEvent::OrderCreated { user, .. }
            | DomainEvent::OrderCancelled { user, .. } => user == address,
            DomainEvent::OrderFilled { user, creator, .. } => user == address || creator == address,
        }
    }

    /// Order id for order lifecycle events
    pub fn order_id(&self) -> Option<u64> {
        match self {
            DomainEvent::OrderCreated { id, .. }
            | DomainEvent::OrderCancelled { id, .. }
            | DomainEvent::OrderFilled { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// A committed event with its position in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Sequence id, starting at 1
    pub id: u64,
    /// Contract that emitted the event
    pub emitter: Address,
    /// Unix seconds of the transaction that produced the event
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: DomainEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> DomainEvent {
        DomainEvent::OrderCreated {
            id: 7,
            user: Address::from_label("user1"),
            token_get: Address::from_label("mETH"),
            amount_get: TokenAmount::tokens(100),
            token_give: Address::from_label("GC"),
            amount_give: TokenAmount::tokens(10),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_field_names_are_camel_case() {
        let json = serde_json::to_value(created()).unwrap();
        assert_eq!(json["event"], "OrderCreated");
        let args = &json["args"];
        assert!(args.get("tokenGet").is_some());
        assert!(args.get("amountGive").is_some());
        assert!(args.get("token_get").is_none());
    }

    #[test]
    fn test_record_flattens_event() {
        let record = EventRecord {
            id: 1,
            emitter: Address::from_label("exchange"),
            timestamp: 1_700_000_000,
            event: created(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_name_and_order_id() {
        let event = created();
        assert_eq!(event.name(), "OrderCreated");
        assert_eq!(event.order_id(), Some(7));

        let transfer = DomainEvent::Transfer {
            from: Address::ZERO,
            to: Address::from_label("a"),
            value: TokenAmount::tokens(1),
        };
        assert_eq!(transfer.name(), "Transfer");
        assert_eq!(transfer.order_id(), None);
    }

    #[test]
    fn test_filled_involves_both_parties() {
        let filler = Address::from_label("user2");
        let creator = Address::from_label("user1");
        let event = DomainEvent::OrderFilled {
            id: 1,
            user: filler,
            token_get: Address::from_label("mETH"),
            amount_get: TokenAmount::tokens(100),
            token_give: Address::from_label("GC"),
            amount_give: TokenAmount::tokens(10),
            creator,
            fee: TokenAmount::tokens(10),
            timestamp: 0,
        };
        assert!(event.involves(&filler));
        assert!(event.involves(&creator));
        assert!(!event.involves(&Address::from_label("fee")));
    }
}
