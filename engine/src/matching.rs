//! Price/time-priority continuous matcher, market-order sweep, and the stop
//! order activation cascade.

use tracing::{debug, warn};

use crate::book::OrderBook;
use crate::stop_book::StopBook;
use crate::types::{Order, Side};

/// Guard against a pathological book where activating a stop repeatedly
/// re-triggers more stops without converging.
const STOP_CASCADE_LIMIT: usize = 1024;

/// The single extension point of the matcher: invoked once per fill with
/// the (possibly synthetic, for market orders) bid and ask order views, the
/// fill size and the execution price. Implementations own the
/// reference-price update, the matcher only reads it back through
/// [`TradeExecutor::reference_price`] to drive the stop cascade.
pub trait TradeExecutor {
    fn on_fill(&mut self, bid: &Order, ask: &Order, size: i64, price: i64);
    fn reference_price(&self) -> i64;
}

/// Drains crossed quotes at the top of the book after a limit order has
/// just been inserted. Loops while `best_bid >= best_ask`, always trading
/// at the resting ask's price (price-improvement for the aggressor falls
/// out naturally since the ask is the older quote).
pub fn match_after_limit_insert<E: TradeExecutor>(book: &mut OrderBook, executor: &mut E) {
    loop {
        let (Some(best_bid), Some(best_ask)) = (book.best_bid(), book.best_ask()) else {
            break;
        };
        if best_bid < best_ask {
            break;
        }
        let exec_price = best_ask;

        let fill = {
            let (bid, ask) = book.front_bid_ask_mut();
            let bid = bid.expect("best_bid price level implies a resting bid order");
            let ask = ask.expect("best_ask price level implies a resting ask order");
            let fill = bid.remaining.min(ask.remaining);
            bid.remaining -= fill;
            ask.remaining -= fill;
            fill
        };

        {
            let bid_ref = book.peek_top(Side::Bid).expect("just matched a bid");
            let ask_ref = book.peek_top(Side::Ask).expect("just matched an ask");
            debug!(fill, exec_price, "limit cross");
            executor.on_fill(bid_ref, ask_ref, fill, exec_price);
        }

        book.settle_front(Side::Bid);
        book.settle_front(Side::Ask);
    }
}

/// Sweeps the opposite side of the book at increasing cost to the taker
/// (ascending price for a bid, descending for an ask) until `order` is
/// fully filled or the book is exhausted. Returns the order (with its
/// final `remaining`) and whether it was fully filled.
///
/// Callers are expected to have pre-checked `OrderBook::has_liquidity`; if
/// the book cannot satisfy the order this still sweeps whatever liquidity
/// exists and returns `filled = false`; the Order Manager pre-check is what
/// actually guarantees atomic all-or-nothing behavior for market orders.
pub fn execute_market<E: TradeExecutor>(
    book: &mut OrderBook,
    mut order: Order,
    executor: &mut E,
) -> (Order, bool) {
    let opposite = order.side.opposite();

    while order.remaining > 0 {
        let Some(resting) = book.front_mut(opposite) else {
            break;
        };
        let fill = order.remaining.min(resting.remaining);
        resting.remaining -= fill;
        let exec_price = resting.limit_price;
        order.remaining -= fill;

        {
            let resting_ref = book.peek_top(opposite).expect("just matched the resting side");
            match order.side {
                Side::Bid => executor.on_fill(&order, resting_ref, fill, exec_price),
                Side::Ask => executor.on_fill(resting_ref, &order, fill, exec_price),
            }
        }

        book.settle_front(opposite);
    }

    let filled = order.remaining == 0;
    (order, filled)
}

/// Repeatedly activates triggered stop orders against the current
/// reference price and re-submits each as a market order, until a scan
/// yields nothing or the safety bound trips.
pub fn run_stop_cascade<E: TradeExecutor>(book: &mut OrderBook, stop_book: &mut StopBook, executor: &mut E) {
    for _ in 0..STOP_CASCADE_LIMIT {
        let triggered = stop_book.activate(executor.reference_price());
        if triggered.is_empty() {
            return;
        }
        for stop in triggered {
            let market_order = stop.into_market();
            execute_market(book, market_order, executor);
        }
    }
    warn!(
        limit = STOP_CASCADE_LIMIT,
        "stop cascade hit the safety bound; breaking to avoid an unbounded activation chain"
    );
}
