//! Order Manager: front door to the engine.
//!
//! Owns the single critical section (order book + stop book + owner/kind
//! index + reference price) behind one [`Mutex`], plus the id allocator,
//! trade log, and both notifiers. Every `submit_*`/`cancel` call takes the
//! lock once, mutates in-memory state and accumulates fills, then releases
//! the lock before doing any I/O.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::book::OrderBook;
use crate::error::EngineError;
use crate::history::{self, OhlcDay};
use crate::ids::IdAllocator;
use crate::matching::{self, TradeExecutor};
use crate::notify::{ThresholdNotifier, TradeNotifier};
use crate::price::is_valid_stop_price;
use crate::stop_book::StopBook;
use crate::trade_log::TradeLog;
use crate::types::{Order, OrderId, OrderKind, Side, Trade};

struct EngineState {
    book: OrderBook,
    stop_book: StopBook,
    /// Owner and kind of every order currently resting in `book` or
    /// `stop_book`. Market orders never appear here: they never rest.
    owners: HashMap<OrderId, String>,
    kinds: HashMap<OrderId, OrderKind>,
    reference_price: i64,
}

struct PendingFill {
    trade: Trade,
    bid: Order,
    ask: Order,
}

/// Built fresh for each `submit_*` call and dropped before its fills are
/// drained; accumulates trade records and prunes the owner/kind index for
/// any order it fills to completion, all still under the engine lock.
struct PendingExecutor<'a> {
    reference_price: i64,
    ids: &'a IdAllocator,
    now: i64,
    owners: &'a mut HashMap<OrderId, String>,
    kinds: &'a mut HashMap<OrderId, OrderKind>,
    fills: Vec<PendingFill>,
}

impl TradeExecutor for PendingExecutor<'_> {
    fn on_fill(&mut self, bid: &Order, ask: &Order, size: i64, price: i64) {
        self.reference_price = price;

        if bid.remaining == 0 {
            self.owners.remove(&bid.id);
            self.kinds.remove(&bid.id);
        }
        if ask.remaining == 0 {
            self.owners.remove(&ask.id);
            self.kinds.remove(&ask.id);
        }

        self.fills.push(PendingFill {
            trade: Trade {
                trade_id: self.ids.next_trade_id(),
                bid_order_id: bid.id,
                ask_order_id: ask.id,
                bid_owner: bid.owner.clone(),
                ask_owner: ask.owner.clone(),
                size,
                price,
                timestamp: self.now,
            },
            bid: bid.clone(),
            ask: ask.clone(),
        });
    }

    fn reference_price(&self) -> i64 {
        self.reference_price
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as i64
}

fn validate_size(size: i64) -> Result<(), EngineError> {
    if size <= 0 {
        return Err(EngineError::Validation("size must be positive".into()));
    }
    Ok(())
}

pub struct OrderManager {
    state: Mutex<EngineState>,
    ids: IdAllocator,
    trade_log: TradeLog,
    threshold_notifier: ThresholdNotifier,
    trade_notifier: TradeNotifier,
}

impl OrderManager {
    /// `bootstrap_reference_price` seeds the reference price used to
    /// validate stop orders before any trade has occurred (see DESIGN.md
    /// open-question decision).
    pub fn new(
        trade_log: TradeLog,
        threshold_notifier: ThresholdNotifier,
        trade_notifier: TradeNotifier,
        bootstrap_reference_price: i64,
    ) -> Result<Self, EngineError> {
        trade_log.init()?;
        Ok(Self {
            state: Mutex::new(EngineState {
                book: OrderBook::new(),
                stop_book: StopBook::new(),
                owners: HashMap::new(),
                kinds: HashMap::new(),
                reference_price: bootstrap_reference_price,
            }),
            ids: IdAllocator::new(),
            trade_log,
            threshold_notifier,
            trade_notifier,
        })
    }

    pub fn reference_price(&self) -> i64 {
        self.state.lock().expect("engine state lock poisoned").reference_price
    }

    pub fn submit_limit(
        &self,
        owner: &str,
        side: Side,
        size: i64,
        limit_price: i64,
    ) -> Result<OrderId, EngineError> {
        validate_size(size)?;
        if limit_price <= 0 {
            return Err(EngineError::Validation("limit_price must be positive".into()));
        }

        let now = now_millis();
        let id = self.ids.next_order_id();
        let order = Order::new_limit(id, owner.to_string(), side, size, limit_price, now);

        let mut state = self.state.lock().expect("engine state lock poisoned");
        let starting_reference_price = state.reference_price;
        state.book.insert_limit(order);
        state.owners.insert(id, owner.to_string());
        state.kinds.insert(id, OrderKind::Limit);

        let fills = {
            let mut executor = PendingExecutor {
                reference_price: state.reference_price,
                ids: &self.ids,
                now,
                owners: &mut state.owners,
                kinds: &mut state.kinds,
                fills: Vec::new(),
            };
            matching::match_after_limit_insert(&mut state.book, &mut executor);
            matching::run_stop_cascade(&mut state.book, &mut state.stop_book, &mut executor);
            state.reference_price = executor.reference_price;
            executor.fills
        };
        drop(state);

        self.settle_fills(starting_reference_price, fills);
        Ok(id)
    }

    pub fn submit_market(&self, owner: &str, side: Side, size: i64) -> Result<OrderId, EngineError> {
        validate_size(size)?;

        let now = now_millis();
        let mut state = self.state.lock().expect("engine state lock poisoned");
        let starting_reference_price = state.reference_price;

        if !state.book.has_liquidity(side.opposite(), size) {
            return Err(EngineError::InsufficientLiquidity {
                side,
                requested: size,
                available: state.book.total_remaining(side.opposite()),
            });
        }

        let id = self.ids.next_order_id();
        let order = Order::new_market(id, owner.to_string(), side, size, now);

        let fills = {
            let mut executor = PendingExecutor {
                reference_price: state.reference_price,
                ids: &self.ids,
                now,
                owners: &mut state.owners,
                kinds: &mut state.kinds,
                fills: Vec::new(),
            };
            let (_order, filled) = matching::execute_market(&mut state.book, order, &mut executor);
            debug_assert!(
                filled,
                "has_liquidity precheck guarantees a full fill under the single engine lock"
            );
            matching::run_stop_cascade(&mut state.book, &mut state.stop_book, &mut executor);
            state.reference_price = executor.reference_price;
            executor.fills
        };
        drop(state);

        self.settle_fills(starting_reference_price, fills);
        Ok(id)
    }

    pub fn submit_stop(
        &self,
        owner: &str,
        side: Side,
        size: i64,
        stop_price: i64,
    ) -> Result<OrderId, EngineError> {
        validate_size(size)?;
        if stop_price <= 0 {
            return Err(EngineError::Validation("stop_price must be positive".into()));
        }

        let now = now_millis();
        let mut state = self.state.lock().expect("engine state lock poisoned");

        if !is_valid_stop_price(side, stop_price, state.reference_price) {
            return Err(EngineError::InvalidStopPrice {
                side,
                stop_price,
                reference_price: state.reference_price,
            });
        }

        let id = self.ids.next_order_id();
        let order = Order::new_stop(id, owner.to_string(), side, size, stop_price, now);
        state.stop_book.insert(order);
        state.owners.insert(id, owner.to_string());
        state.kinds.insert(id, OrderKind::Stop);

        Ok(id)
    }

    /// `100` on success, `101` if the order is missing, owned by another
    /// actor, or already terminal, mapped by the caller at the wire
    /// boundary; here both failure modes collapse to a single error.
    pub fn cancel(&self, owner: &str, order_id: OrderId) -> Result<(), EngineError> {
        let mut state = self.state.lock().expect("engine state lock poisoned");

        let Some(registered_owner) = state.owners.get(&order_id).cloned() else {
            return Err(EngineError::OrderNotCancellable);
        };
        if registered_owner != owner {
            return Err(EngineError::OrderNotCancellable);
        }

        let kind = state.kinds.get(&order_id).copied().unwrap_or(OrderKind::Limit);
        let removed = match kind {
            OrderKind::Stop => state.stop_book.remove(order_id),
            OrderKind::Limit | OrderKind::Market => state.book.remove(order_id),
        };

        if !removed {
            return Err(EngineError::OrderNotCancellable);
        }
        state.owners.remove(&order_id);
        state.kinds.remove(&order_id);
        Ok(())
    }

    pub fn register_threshold(&self, owner: &str, threshold: i64) -> Result<(), EngineError> {
        if threshold <= 0 {
            return Err(EngineError::Validation("threshold must be positive".into()));
        }
        self.threshold_notifier.register(owner, threshold);
        Ok(())
    }

    pub fn unregister_threshold(&self, owner: &str) {
        self.threshold_notifier.unregister(owner);
    }

    pub fn register_trade_endpoint(&self, owner: &str, addr: std::net::SocketAddr) {
        self.trade_notifier.register_endpoint(owner, addr);
    }

    pub fn unregister_trade_endpoint(&self, owner: &str) {
        self.trade_notifier.unregister_endpoint(owner);
    }

    pub fn price_history(&self, month: &str) -> Result<Vec<OhlcDay>, EngineError> {
        let trades = self.trade_log.load_all();
        history::price_history(&trades, month)
    }

    /// Persists and publishes fills in order, outside the engine lock. The
    /// price-change comparison walks forward from the reference price that
    /// was current before this batch, matching each fill's "old vs new"
    /// transition exactly as it happened under the lock.
    fn settle_fills(&self, starting_reference_price: i64, fills: Vec<PendingFill>) {
        let mut prev_price = starting_reference_price;
        for fill in fills {
            if let Err(e) = self.trade_log.append(&fill.trade) {
                warn!(error = %e, trade_id = fill.trade.trade_id.0, "failed to persist trade");
            }

            if fill.trade.price != prev_price {
                self.threshold_notifier.on_price(fill.trade.price, fill.trade.timestamp);
            }
            prev_price = fill.trade.price;

            self.trade_notifier
                .notify(&fill.bid, &fill.ask.owner, fill.trade.size, fill.trade.price, fill.trade.timestamp);
            self.trade_notifier
                .notify(&fill.ask, &fill.bid.owner, fill.trade.size, fill.trade.price, fill.trade.timestamp);
        }
    }
}
