//! Core data types: orders, trades, sides and kinds.
//!
//! All monetary quantities are integers in millis (thousandths of a whole
//! unit) so the engine never touches floating point.

use serde::{Deserialize, Serialize};

/// Which side of the book an order rests on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The other side of the book.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// What kind of order this is; governs which price fields are meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Limit,
    Market,
    Stop,
}

/// Unique, monotonically assigned order identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// Unique, monotonically assigned trade identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub u64);

/// A single order. `remaining` is monotonically non-increasing and the
/// order must leave every book once it reaches zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: String,
    pub side: Side,
    pub kind: OrderKind,
    /// Original size in millis, strictly positive.
    pub size: i64,
    /// Price level in millis for `Limit`; 0 for `Market`/`Stop`.
    pub limit_price: i64,
    /// Trigger price in millis for `Stop`; 0 otherwise.
    pub stop_price: i64,
    /// Wall-clock millis at creation; audit/display only. Arrival order in
    /// the level queue, not this field, determines FIFO priority.
    pub created_at: i64,
    /// Size yet to fill. `0 <= remaining <= size`.
    pub remaining: i64,
}

impl Order {
    pub fn new_limit(
        id: OrderId,
        owner: String,
        side: Side,
        size: i64,
        limit_price: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            owner,
            side,
            kind: OrderKind::Limit,
            size,
            limit_price,
            stop_price: 0,
            created_at,
            remaining: size,
        }
    }

    pub fn new_market(id: OrderId, owner: String, side: Side, size: i64, created_at: i64) -> Self {
        Self {
            id,
            owner,
            side,
            kind: OrderKind::Market,
            size,
            limit_price: 0,
            stop_price: 0,
            created_at,
            remaining: size,
        }
    }

    pub fn new_stop(
        id: OrderId,
        owner: String,
        side: Side,
        size: i64,
        stop_price: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            owner,
            side,
            kind: OrderKind::Stop,
            size,
            limit_price: 0,
            stop_price,
            created_at,
            remaining: size,
        }
    }

    /// An activated stop order, reborn as a market order with the same id,
    /// owner and remaining size.
    pub fn into_market(self) -> Order {
        Order {
            id: self.id,
            owner: self.owner,
            side: self.side,
            kind: OrderKind::Market,
            size: self.size,
            limit_price: 0,
            stop_price: 0,
            created_at: self.created_at,
            remaining: self.remaining,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.remaining == 0
    }
}

/// Immutable record of a fill between a bid and an ask order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub bid_order_id: OrderId,
    pub ask_order_id: OrderId,
    pub bid_owner: String,
    pub ask_owner: String,
    pub size: i64,
    pub price: i64,
    /// Unix seconds.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_order_has_zero_prices() {
        let o = Order::new_market(OrderId(1), "alice".into(), Side::Bid, 1000, 0);
        assert_eq!(o.limit_price, 0);
        assert_eq!(o.stop_price, 0);
        assert_eq!(o.remaining, o.size);
    }

    #[test]
    fn stop_order_reborn_as_market_keeps_identity() {
        let stop = Order::new_stop(OrderId(7), "dave".into(), Side::Bid, 300, 58_500_000, 10);
        let market = stop.clone().into_market();
        assert_eq!(market.id, stop.id);
        assert_eq!(market.owner, stop.owner);
        assert_eq!(market.kind, OrderKind::Market);
        assert_eq!(market.limit_price, 0);
        assert_eq!(market.remaining, stop.remaining);
    }

    #[test]
    fn opposite_side_round_trips() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }
}
