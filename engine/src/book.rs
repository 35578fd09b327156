//! In-memory limit order book: two price-keyed FIFO sides.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::types::{Order, OrderId, Side};

/// One side of the book: a price-sorted map of FIFO queues.
struct BookSide {
    side: Side,
    levels: BTreeMap<i64, VecDeque<Order>>,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    fn insert(&mut self, order: Order) {
        self.levels.entry(order.limit_price).or_default().push_back(order);
    }

    /// Best price for this side: highest key for bids, lowest for asks.
    fn best_price(&self) -> Option<i64> {
        match self.side {
            Side::Bid => self.levels.last_key_value().map(|(p, _)| *p),
            Side::Ask => self.levels.first_key_value().map(|(p, _)| *p),
        }
    }

    fn front_at_best(&self) -> Option<&Order> {
        let price = self.best_price()?;
        self.levels.get(&price)?.front()
    }

    fn front_at_best_mut(&mut self) -> Option<&mut Order> {
        let price = self.best_price()?;
        self.levels.get_mut(&price)?.front_mut()
    }

    /// Drops the front order of the best level if it is terminal
    /// (`remaining == 0`), cleaning up an emptied level.
    fn drop_front_if_terminal(&mut self) {
        let Some(price) = self.best_price() else { return };
        let Some(queue) = self.levels.get_mut(&price) else { return };
        if matches!(queue.front(), Some(o) if o.is_terminal()) {
            queue.pop_front();
        }
        if queue.is_empty() {
            self.levels.remove(&price);
        }
    }

    /// Locates and removes the order with the given id at `price`,
    /// returning it. Cleans up an emptied level.
    fn remove_at(&mut self, price: i64, id: OrderId) -> Option<Order> {
        let queue = self.levels.get_mut(&price)?;
        let pos = queue.iter().position(|o| o.id == id)?;
        let order = queue.remove(pos);
        if queue.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    /// Price levels best-first: ascending for asks, descending for bids.
    fn levels_best_first(&self) -> Box<dyn Iterator<Item = (i64, &VecDeque<Order>)> + '_> {
        match self.side {
            Side::Ask => Box::new(self.levels.iter().map(|(p, q)| (*p, q))),
            Side::Bid => Box::new(self.levels.iter().rev().map(|(p, q)| (*p, q))),
        }
    }

    fn total_remaining(&self) -> i64 {
        self.levels.values().flatten().map(|o| o.remaining).sum()
    }
}

/// The two-sided limit order book plus an id -> price index for O(1)
/// removal without scanning both sides.
pub struct OrderBook {
    bids: BookSide,
    asks: BookSide,
    index: HashMap<OrderId, (Side, i64)>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            index: HashMap::new(),
        }
    }

    pub fn insert_limit(&mut self, order: Order) {
        self.index.insert(order.id, (order.side, order.limit_price));
        match order.side {
            Side::Bid => self.bids.insert(order),
            Side::Ask => self.asks.insert(order),
        }
    }

    /// Locates and unlinks the order from its level. Returns whether
    /// removal occurred.
    pub fn remove(&mut self, id: OrderId) -> bool {
        let Some((side, price)) = self.index.remove(&id) else {
            return false;
        };
        let side_book = self.side_mut(side);
        side_book.remove_at(price, id).is_some()
    }

    pub fn best_bid(&self) -> Option<i64> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<i64> {
        self.asks.best_price()
    }

    /// Earliest order at the best price of the given side.
    pub fn peek_top(&self, side: Side) -> Option<&Order> {
        self.side_ref(side).front_at_best()
    }

    pub(crate) fn front_mut(&mut self, side: Side) -> Option<&mut Order> {
        self.side_mut(side).front_at_best_mut()
    }

    /// Disjoint mutable borrows of the best resting order on each side at
    /// once, needed because a limit cross must decrement both legs before
    /// either is read back by the executor. Borrowing `self.bids` and
    /// `self.asks` directly (rather than routing both through `side_mut`)
    /// is what lets the borrow checker see the two borrows as disjoint.
    pub(crate) fn front_bid_ask_mut(&mut self) -> (Option<&mut Order>, Option<&mut Order>) {
        (self.bids.front_at_best_mut(), self.asks.front_at_best_mut())
    }

    /// Drops the front order of `side`'s best level if it has been fully
    /// filled, and keeps the index in sync.
    pub(crate) fn settle_front(&mut self, side: Side) {
        let id = self.side_ref(side).front_at_best().map(|o| o.id);
        self.side_mut(side).drop_front_if_terminal();
        if let Some(id) = id {
            if !self.side_ref(side).front_at_best().map(|o| o.id == id).unwrap_or(false) {
                self.index.remove(&id);
            }
        }
    }

    /// Sums `remaining` across `side` in price-sorted (best-first) order
    /// until `required_size` is reached.
    pub fn has_liquidity(&self, side: Side, required_size: i64) -> bool {
        let mut acc = 0i64;
        for (_, queue) in self.side_ref(side).levels_best_first() {
            for order in queue {
                acc += order.remaining;
                if acc >= required_size {
                    return true;
                }
            }
        }
        false
    }

    pub(crate) fn levels_best_first(
        &self,
        side: Side,
    ) -> Box<dyn Iterator<Item = (i64, &VecDeque<Order>)> + '_> {
        self.side_ref(side).levels_best_first()
    }

    pub fn total_remaining(&self, side: Side) -> i64 {
        self.side_ref(side).total_remaining()
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    fn side_ref(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Order;

    fn limit(id: u64, owner: &str, side: Side, size: i64, price: i64, ts: i64) -> Order {
        Order::new_limit(OrderId(id), owner.to_string(), side, size, price, ts)
    }

    #[test]
    fn best_bid_ask_reflect_resting_orders() {
        let mut book = OrderBook::new();
        book.insert_limit(limit(1, "alice", Side::Ask, 1000, 58_000_000, 1));
        book.insert_limit(limit(2, "bob", Side::Bid, 1000, 57_900_000, 2));

        assert_eq!(book.best_ask(), Some(58_000_000));
        assert_eq!(book.best_bid(), Some(57_900_000));
    }

    #[test]
    fn fifo_within_price_level() {
        let mut book = OrderBook::new();
        book.insert_limit(limit(1, "a", Side::Bid, 100, 58_000_000, 1));
        book.insert_limit(limit(2, "b", Side::Bid, 100, 58_000_000, 2));

        let top = book.peek_top(Side::Bid).unwrap();
        assert_eq!(top.id, OrderId(1));
    }

    #[test]
    fn remove_unlinks_order_and_empties_level() {
        let mut book = OrderBook::new();
        book.insert_limit(limit(1, "a", Side::Bid, 100, 58_000_000, 1));
        assert!(book.remove(OrderId(1)));
        assert_eq!(book.best_bid(), None);
        assert!(!book.remove(OrderId(1)), "second removal is a no-op");
    }

    #[test]
    fn has_liquidity_sums_across_levels() {
        let mut book = OrderBook::new();
        book.insert_limit(limit(1, "a", Side::Ask, 500, 58_000_000, 1));
        book.insert_limit(limit(2, "b", Side::Ask, 500, 58_100_000, 2));

        assert!(book.has_liquidity(Side::Ask, 800));
        assert!(!book.has_liquidity(Side::Ask, 1001));
    }

    #[test]
    fn settle_front_removes_only_when_terminal() {
        let mut book = OrderBook::new();
        book.insert_limit(limit(1, "a", Side::Bid, 100, 58_000_000, 1));

        book.front_mut(Side::Bid).unwrap().remaining -= 40;
        book.settle_front(Side::Bid);
        assert_eq!(book.peek_top(Side::Bid).unwrap().remaining, 60);
        assert!(book.contains(OrderId(1)));

        book.front_mut(Side::Bid).unwrap().remaining = 0;
        book.settle_front(Side::Bid);
        assert!(book.peek_top(Side::Bid).is_none());
        assert!(!book.contains(OrderId(1)));
    }
}
