//! Resting stop orders, keyed by id, with reference-price activation scans.

use std::collections::HashMap;

use crate::types::{Order, OrderId, OrderKind, Side};

pub struct StopBook {
    orders: HashMap<OrderId, Order>,
}

impl StopBook {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    /// Requires `order.kind == Stop`.
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.kind, OrderKind::Stop);
        self.orders.insert(order.id, order);
    }

    pub fn remove(&mut self, id: OrderId) -> bool {
        self.orders.remove(&id).is_some()
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Removes and returns every order whose trigger condition is met
    /// against `reference_price`: bids with `stop_price <= reference_price`,
    /// asks with `stop_price >= reference_price`. Non-strict, unlike
    /// submission-time validation (see DESIGN.md open question). Order of
    /// the returned vector is unspecified.
    pub fn activate(&mut self, reference_price: i64) -> Vec<Order> {
        let triggered_ids: Vec<OrderId> = self
            .orders
            .values()
            .filter(|o| Self::triggers(o, reference_price))
            .map(|o| o.id)
            .collect();

        triggered_ids
            .into_iter()
            .filter_map(|id| self.orders.remove(&id))
            .collect()
    }

    fn triggers(order: &Order, reference_price: i64) -> bool {
        match order.side {
            Side::Bid => order.stop_price <= reference_price,
            Side::Ask => order.stop_price >= reference_price,
        }
    }
}

impl Default for StopBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: u64, side: Side, stop_price: i64) -> Order {
        Order::new_stop(OrderId(id), "dave".to_string(), side, 300, stop_price, 0)
    }

    #[test]
    fn bid_stop_triggers_non_strict() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Bid, 58_500_000));

        assert!(book.activate(58_400_000).is_empty());
        let triggered = book.activate(58_500_000);
        assert_eq!(triggered.len(), 1);
        assert!(!book.contains(OrderId(1)));
    }

    #[test]
    fn ask_stop_triggers_non_strict() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Ask, 57_500_000));

        assert!(book.activate(57_600_000).is_empty());
        let triggered = book.activate(57_500_000);
        assert_eq!(triggered.len(), 1);
    }

    #[test]
    fn triggered_order_is_removed_and_never_fires_twice() {
        let mut book = StopBook::new();
        book.insert(stop(1, Side::Bid, 58_000_000));
        let first = book.activate(59_000_000);
        assert_eq!(first.len(), 1);
        let second = book.activate(59_000_000);
        assert!(second.is_empty());
    }
}
