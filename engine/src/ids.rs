//! Monotonic, process-wide id generation for orders and trades.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{OrderId, TradeId};

/// Safe for concurrent callers: each counter is a single atomic increment.
pub struct IdAllocator {
    next_order: AtomicU64,
    next_trade: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            // Start at 1 so `-1` can unambiguously mean "rejected" on the wire.
            next_order: AtomicU64::new(1),
            next_trade: AtomicU64::new(1),
        }
    }

    pub fn next_order_id(&self) -> OrderId {
        OrderId(self.next_order.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_trade_id(&self) -> TradeId {
        TradeId(self.next_trade.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let alloc = IdAllocator::new();
        let a = alloc.next_order_id();
        let b = alloc.next_order_id();
        assert!(b.0 > a.0);
    }

    #[test]
    fn order_and_trade_counters_are_independent() {
        let alloc = IdAllocator::new();
        let o = alloc.next_order_id();
        let t = alloc.next_trade_id();
        assert_eq!(o.0, 1);
        assert_eq!(t.0, 1);
    }

    #[test]
    fn concurrent_callers_never_collide() {
        use std::sync::Arc;
        use std::thread;

        let alloc = Arc::new(IdAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let alloc = alloc.clone();
            handles.push(thread::spawn(move || {
                (0..1000).map(|_| alloc.next_order_id().0).collect::<Vec<_>>()
            }));
        }
        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        let before = all.len();
        all.dedup();
        assert_eq!(before, all.len(), "no id was issued twice");
    }
}
