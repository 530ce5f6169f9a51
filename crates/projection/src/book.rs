//! Pair views - order book and trade history for a token pair
//!
//! Pure functions over `OrderView`s. Prices are quoted as token1 per
//! token0, rounded to `PRICE_DECIMALS` places.

use crate::order::OrderView;
use gcdex_core::{Address, TokenAmount, DEFAULT_DECIMALS};
use rust_decimal::Decimal;
use strum_macros::Display;

/// Decimal places of a displayed price
pub const PRICE_DECIMALS: u32 = 5;

/// Direction of an order relative to token0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OrderSide {
    /// Gives token1 to get token0
    Buy,
    /// Gives token0 to get token1
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// Price movement of a trade against the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
}

/// An order with pair-relative amounts and price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedOrder {
    pub order: OrderView,
    pub side: OrderSide,
    pub token0_amount: Decimal,
    pub token1_amount: Decimal,
    /// token1 per token0; `None` when the token0 amount is zero
    pub price: Option<Decimal>,
}

/// Open orders of a pair split by side, each sorted by price descending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    pub buy_orders: Vec<DecoratedOrder>,
    pub sell_orders: Vec<DecoratedOrder>,
}

/// A filled order with its price trend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeView {
    pub trade: DecoratedOrder,
    pub trend: PriceTrend,
}

/// A selected market: token0 is the base, token1 the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPair {
    pub token0: Address,
    pub token1: Address,
    pub decimals: u32,
}

impl TokenPair {
    pub fn new(token0: Address, token1: Address) -> Self {
        Self {
            token0,
            token1,
            decimals: DEFAULT_DECIMALS,
        }
    }

    /// Both legs of the order are tokens of this pair
    pub fn contains(&self, order: &OrderView) -> bool {
        let in_pair = |t: &Address| *t == self.token0 || *t == self.token1;
        in_pair(&order.token_get) && in_pair(&order.token_give)
    }

    /// Pair-relative view of `order`, `None` if it trades other tokens
    pub fn decorate(&self, order: &OrderView) -> Option<DecoratedOrder> {
        if !self.contains(order) {
            return None;
        }

        let (side, token0, token1) = if order.token_give == self.token1 {
            (OrderSide::Buy, order.amount_get, order.amount_give)
        } else {
            (OrderSide::Sell, order.amount_give, order.amount_get)
        };
        let token0_amount = self.to_decimal(token0);
        let token1_amount = self.to_decimal(token1);
        let price = token1_amount
            .checked_div(token0_amount)
            .map(|p| p.round_dp(PRICE_DECIMALS));

        Some(DecoratedOrder {
            order: order.clone(),
            side,
            token0_amount,
            token1_amount,
            price,
        })
    }

    /// Build the book from open orders
    pub fn order_book(&self, open: &[OrderView]) -> OrderBook {
        let mut book = OrderBook::default();
        for decorated in open.iter().filter_map(|o| self.decorate(o)) {
            match decorated.side {
                OrderSide::Buy => book.buy_orders.push(decorated),
                OrderSide::Sell => book.sell_orders.push(decorated),
            }
        }
        book.buy_orders.sort_by(|a, b| b.price.cmp(&a.price));
        book.sell_orders.sort_by(|a, b| b.price.cmp(&a.price));
        book
    }

    /// Trades of this pair, newest first. Each trend compares a trade's
    /// price with the trade filled just before it; the first is `Up`.
    pub fn trades(&self, filled: &[OrderView]) -> Vec<TradeView> {
        let mut trades: Vec<DecoratedOrder> = filled.iter().filter_map(|o| self.decorate(o)).collect();
        trades.sort_by_key(|t| (t.order.closed_at, t.order.id));

        let mut previous: Option<Decimal> = None;
        let mut views: Vec<TradeView> = trades
            .into_iter()
            .map(|trade| {
                let trend = match (previous, trade.price) {
                    (Some(prev), Some(price)) if price < prev => PriceTrend::Down,
                    _ => PriceTrend::Up,
                };
                previous = trade.price;
                TradeView { trade, trend }
            })
            .collect();
        views.reverse();
        views
    }

    /// `user`'s trades of this pair, newest first, with the side seen
    /// from `user`: a filler takes the opposite side of the order.
    pub fn user_trades(&self, filled: &[OrderView], user: &Address) -> Vec<DecoratedOrder> {
        let mut trades: Vec<DecoratedOrder> = filled
            .iter()
            .filter(|o| o.involves(user))
            .filter_map(|o| self.decorate(o))
            .map(|mut trade| {
                if trade.order.user != *user {
                    trade.side = trade.side.opposite();
                }
                trade
            })
            .collect();
        trades.sort_by(|a, b| (b.order.closed_at, b.order.id).cmp(&(a.order.closed_at, a.order.id)));
        trades
    }

    fn to_decimal(&self, amount: TokenAmount) -> Decimal {
        amount.to_decimal(self.decimals).unwrap_or(Decimal::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcdex_exchange::OrderStatus;
    use rust_decimal_macros::dec;

    fn gc() -> Address {
        Address::from_label("gc")
    }

    fn meth() -> Address {
        Address::from_label("meth")
    }

    fn order(id: u64, get: (Address, u64), give: (Address, u64)) -> OrderView {
        OrderView {
            id,
            user: Address::from_label("user1"),
            token_get: get.0,
            amount_get: TokenAmount::tokens(get.1),
            token_give: give.0,
            amount_give: TokenAmount::tokens(give.1),
            timestamp: 1_700_000_000 + id,
            status: OrderStatus::Open,
            filler: None,
            fee: None,
            closed_at: None,
        }
    }

    fn filled(mut o: OrderView, filler: &str, at: u64) -> OrderView {
        o.status = OrderStatus::Filled;
        o.filler = Some(Address::from_label(filler));
        o.fee = Some(TokenAmount::ZERO);
        o.closed_at = Some(at);
        o
    }

    #[test]
    fn test_decorate_sell_and_buy() {
        let pair = TokenPair::new(gc(), meth());

        // Gives GC (token0) for mETH: a sell
        let sell = pair.decorate(&order(1, (meth(), 100), (gc(), 10))).unwrap();
        assert_eq!(sell.side, OrderSide::Sell);
        assert_eq!(sell.token0_amount, dec!(10));
        assert_eq!(sell.token1_amount, dec!(100));
        assert_eq!(sell.price, Some(dec!(10)));

        // Gives mETH (token1) for GC: a buy
        let buy = pair.decorate(&order(2, (gc(), 3), (meth(), 1))).unwrap();
        assert_eq!(buy.side, OrderSide::Buy);
        assert_eq!(buy.price, Some(dec!(0.33333)));
    }

    #[test]
    fn test_decorate_skips_other_pairs() {
        let pair = TokenPair::new(gc(), meth());
        let mdai = Address::from_label("mdai");
        assert!(pair.decorate(&order(1, (mdai, 1), (gc(), 1))).is_none());
    }

    #[test]
    fn test_zero_amount_has_no_price() {
        let pair = TokenPair::new(gc(), meth());
        let decorated = pair.decorate(&order(1, (meth(), 1), (gc(), 0))).unwrap();
        assert_eq!(decorated.price, None);
    }

    #[test]
    fn test_order_book_sorted_by_price_desc() {
        let pair = TokenPair::new(gc(), meth());
        let open = vec![
            order(1, (meth(), 10), (gc(), 10)),
            order(2, (meth(), 30), (gc(), 10)),
            order(3, (meth(), 20), (gc(), 10)),
            order(4, (gc(), 10), (meth(), 10)),
            order(5, (gc(), 10), (meth(), 50)),
        ];

        let book = pair.order_book(&open);

        let sell_ids: Vec<u64> = book.sell_orders.iter().map(|o| o.order.id).collect();
        let buy_ids: Vec<u64> = book.buy_orders.iter().map(|o| o.order.id).collect();
        assert_eq!(sell_ids, [2, 3, 1]);
        assert_eq!(buy_ids, [5, 4]);
    }

    #[test]
    fn test_trades_trend_against_previous_fill() {
        let pair = TokenPair::new(gc(), meth());
        let fills = vec![
            filled(order(1, (meth(), 100), (gc(), 10)), "user2", 10),
            filled(order(2, (meth(), 50), (gc(), 15)), "user2", 11),
            filled(order(3, (meth(), 200), (gc(), 20)), "user2", 12),
        ];

        let trades = pair.trades(&fills);

        let view: Vec<(u64, PriceTrend)> = trades.iter().map(|t| (t.trade.order.id, t.trend)).collect();
        assert_eq!(
            view,
            [(3, PriceTrend::Up), (2, PriceTrend::Down), (1, PriceTrend::Up)]
        );
    }

    #[test]
    fn test_user_trades_side_from_user_perspective() {
        let pair = TokenPair::new(gc(), meth());
        let fills = vec![filled(order(1, (meth(), 100), (gc(), 10)), "user2", 10)];

        let creator = pair.user_trades(&fills, &Address::from_label("user1"));
        let filler = pair.user_trades(&fills, &Address::from_label("user2"));
        let bystander = pair.user_trades(&fills, &Address::from_label("user3"));

        assert_eq!(creator[0].side, OrderSide::Sell);
        assert_eq!(filler[0].side, OrderSide::Buy);
        assert!(bystander.is_empty());
    }
}
