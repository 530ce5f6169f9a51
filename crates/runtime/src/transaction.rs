//! Transactions and receipts

use gcdex_core::{Address, TokenAmount};
use gcdex_events::EventRecord;
use gcdex_exchange::{ExchangeConfig, OrderId};
use gcdex_token::TokenConfig;
use serde::{Deserialize, Serialize};

/// One state-changing call, attributed to `sender` at `timestamp`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    /// Unix seconds
    pub timestamp: u64,
    pub call: Call,
}

impl Transaction {
    pub fn new(sender: Address, timestamp: u64, call: Call) -> Self {
        Self {
            sender,
            timestamp,
            call,
        }
    }
}

/// Every contract entry point a transaction can invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Call {
    DeployToken {
        config: TokenConfig,
    },
    DeployExchange {
        config: ExchangeConfig,
    },
    Transfer {
        token: Address,
        to: Address,
        amount: TokenAmount,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: TokenAmount,
    },
    TransferFrom {
        token: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    },
    DepositToken {
        token: Address,
        amount: TokenAmount,
    },
    WithdrawToken {
        token: Address,
        amount: TokenAmount,
    },
    MakeOrder {
        token_get: Address,
        amount_get: TokenAmount,
        token_give: Address,
        amount_give: TokenAmount,
    },
    CancelOrder {
        id: OrderId,
    },
    FillOrder {
        id: OrderId,
    },
}

impl Call {
    /// Method name as journaled, e.g. `"fill_order"`
    pub fn method(&self) -> &'static str {
        match self {
            Call::DeployToken { .. } => "deploy_token",
            Call::DeployExchange { .. } => "deploy_exchange",
            Call::Transfer { .. } => "transfer",
            Call::Approve { .. } => "approve",
            Call::TransferFrom { .. } => "transfer_from",
            Call::DepositToken { .. } => "deposit_token",
            Call::WithdrawToken { .. } => "withdraw_token",
            Call::MakeOrder { .. } => "make_order",
            Call::CancelOrder { .. } => "cancel_order",
            Call::FillOrder { .. } => "fill_order",
        }
    }
}

/// Result of a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position among committed transactions, starting at 1
    pub index: u64,
    /// Address of a contract deployed by this transaction
    pub contract: Option<Address>,
    /// Id of an order created by this transaction
    pub order_id: Option<OrderId>,
    pub events: Vec<EventRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_json_shape() {
        let call = Call::FillOrder { id: 4 };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["method"], "fill_order");
        assert_eq!(json["id"], 4);
        assert_eq!(call.method(), "fill_order");
    }

    #[test]
    fn test_transaction_round_trip() {
        let tx = Transaction::new(
            Address::from_label("user1"),
            1_700_000_000,
            Call::MakeOrder {
                token_get: Address::from_label("meth"),
                amount_get: TokenAmount::tokens(1),
                token_give: Address::from_label("gc"),
                amount_give: TokenAmount::tokens(10),
            },
        );
        let json = serde_json::to_string(&tx).unwrap();
        let parsed: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tx);
    }
}
