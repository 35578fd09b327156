//! End-to-end scenarios driven through `OrderManager`, matching the literal
//! inputs and expected outcomes documented for the engine.

use std::net::SocketAddr;
use std::sync::Arc;

use engine::error::EngineError;
use engine::manager::OrderManager;
use engine::notify::threshold::{MulticastSink, NullSink, ThresholdNotifier};
use engine::notify::trade::{TradeNotifier, UnicastSink};
use engine::trade_log::TradeLog;
use engine::types::Side;

struct NullUnicastSink;
impl UnicastSink for NullUnicastSink {
    fn send_to(&self, _addr: SocketAddr, _payload: &[u8]) {}
}

fn manager_with_bootstrap(bootstrap: i64) -> (OrderManager, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let trade_log = TradeLog::new(dir.path().join("StoricoOrdini.json"));
    let threshold_notifier = ThresholdNotifier::new(Arc::new(NullSink));
    let trade_notifier = TradeNotifier::new(Box::new(NullUnicastSink));
    let mgr = OrderManager::new(trade_log, threshold_notifier, trade_notifier, bootstrap).unwrap();
    (mgr, dir)
}

struct CapturingSink {
    payloads: std::sync::Mutex<Vec<Vec<u8>>>,
}

impl CapturingSink {
    fn new() -> Self {
        Self {
            payloads: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl MulticastSink for CapturingSink {
    fn publish(&self, payload: &[u8]) {
        self.payloads.lock().unwrap().push(payload.to_vec());
    }
}

fn manager_with_capturing_sink(bootstrap: i64) -> (OrderManager, Arc<CapturingSink>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let trade_log = TradeLog::new(dir.path().join("StoricoOrdini.json"));
    let sink = Arc::new(CapturingSink::new());
    let threshold_notifier = ThresholdNotifier::new(sink.clone());
    let trade_notifier = TradeNotifier::new(Box::new(NullUnicastSink));
    let mgr = OrderManager::new(trade_log, threshold_notifier, trade_notifier, bootstrap).unwrap();
    (mgr, sink, dir)
}

#[test]
fn s1_limit_cross_with_price_improvement() {
    let (mgr, _dir) = manager_with_bootstrap(0);

    mgr.submit_limit("alice", Side::Ask, 1000, 58_000_000).unwrap();
    mgr.submit_limit("bob", Side::Bid, 1000, 58_100_000).unwrap();

    assert_eq!(mgr.reference_price(), 58_000_000);
}

#[test]
fn s2_market_sweep_across_levels() {
    let (mgr, _dir) = manager_with_bootstrap(0);

    mgr.submit_limit("a1", Side::Ask, 500, 58_000_000).unwrap();
    mgr.submit_limit("a2", Side::Ask, 500, 58_100_000).unwrap();

    let id = mgr.submit_market("carol", Side::Bid, 800).unwrap();
    assert!(id.0 > 0);
    assert_eq!(mgr.reference_price(), 58_100_000);
}

#[test]
fn s3_market_rejected_on_insufficient_liquidity() {
    let (mgr, _dir) = manager_with_bootstrap(0);

    mgr.submit_limit("alice", Side::Ask, 100, 58_000_000).unwrap();
    let result = mgr.submit_market("bob", Side::Bid, 500);

    assert!(matches!(result, Err(EngineError::InsufficientLiquidity { .. })));
    assert_eq!(mgr.reference_price(), 0, "rejected market order must not move the book");
}

#[test]
fn s4_stop_buy_triggers_and_cascades() {
    let (mgr, _dir) = manager_with_bootstrap(58_000_000);

    let stop_id = mgr.submit_stop("dave", Side::Bid, 300, 58_500_000).unwrap();
    mgr.submit_limit("ask1", Side::Ask, 300, 58_600_000).unwrap();
    mgr.submit_limit("ask2", Side::Ask, 300, 58_700_000).unwrap();
    // Crossing this bid against ask1 moves the reference price to
    // 58_600_000, which triggers dave's resting stop (58_500_000 <=
    // 58_600_000); the stop then sweeps ask2 at 58_700_000.
    mgr.submit_limit("bidder", Side::Bid, 300, 58_600_000).unwrap();

    assert_eq!(mgr.reference_price(), 58_700_000);
    // The stop converted into a market fill and is gone from both books;
    // cancelling it now must fail.
    assert!(matches!(mgr.cancel("dave", stop_id), Err(EngineError::OrderNotCancellable)));
}

#[test]
fn s5_fifo_at_same_price() {
    let (mgr, _dir) = manager_with_bootstrap(0);

    let b1 = mgr.submit_limit("b1", Side::Bid, 100, 58_000_000).unwrap();
    let b2 = mgr.submit_limit("b2", Side::Bid, 100, 58_000_000).unwrap();

    mgr.submit_market("taker", Side::Ask, 100).unwrap();

    // b1 filled first and is gone; b2 still rests untouched.
    assert!(matches!(mgr.cancel("b1", b1), Err(EngineError::OrderNotCancellable)));
    assert!(mgr.cancel("b2", b2).is_ok());
}

#[test]
fn s6_threshold_fires_once() {
    let (mgr, sink, _dir) = manager_with_capturing_sink(0);

    mgr.register_threshold("eve", 58_500_000).unwrap();

    mgr.submit_limit("a1", Side::Ask, 1000, 58_000_000).unwrap();
    mgr.submit_limit("b1", Side::Bid, 1000, 58_000_000).unwrap();
    assert_eq!(mgr.reference_price(), 58_000_000);
    assert!(sink.payloads.lock().unwrap().is_empty(), "below threshold, no fire");

    mgr.submit_limit("a2", Side::Ask, 1000, 58_600_000).unwrap();
    mgr.submit_limit("b2", Side::Bid, 1000, 58_600_000).unwrap();
    assert_eq!(mgr.reference_price(), 58_600_000);

    mgr.submit_limit("a3", Side::Ask, 1000, 58_700_000).unwrap();
    mgr.submit_limit("b3", Side::Bid, 1000, 58_700_000).unwrap();
    assert_eq!(mgr.reference_price(), 58_700_000);

    let payloads = sink.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1, "threshold must fire exactly once");
    let alert: serde_json::Value = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(alert["username"], "eve");
    assert_eq!(alert["currentPrice"], 58_600_000);
}

#[test]
fn p8_cancel_idempotence() {
    let (mgr, _dir) = manager_with_bootstrap(0);

    let id = mgr.submit_limit("alice", Side::Bid, 100, 58_000_000).unwrap();
    assert!(mgr.cancel("alice", id).is_ok());
    assert!(matches!(mgr.cancel("alice", id), Err(EngineError::OrderNotCancellable)));
}
