//! Per-counterparty, best-effort unicast trade-execution notifications.

use std::net::SocketAddr;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{Order, OrderKind, Side};

/// Abstracts the unicast transport; production wiring is a plain
/// `std::net::UdpSocket` in `exchange-service`.
pub trait UnicastSink: Send + Sync {
    fn send_to(&self, addr: SocketAddr, payload: &[u8]);
}

#[derive(Debug, Clone, Serialize)]
struct ClosedTrade {
    #[serde(rename = "orderId")]
    order_id: u64,
    #[serde(rename = "type")]
    side: &'static str,
    #[serde(rename = "orderType")]
    order_type: &'static str,
    size: i64,
    price: i64,
    counterparty: String,
    timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
struct ClosedTradesNotification {
    notification: &'static str,
    trades: Vec<ClosedTrade>,
}

fn order_type_label(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Limit => "limit",
        OrderKind::Market => "market",
        OrderKind::Stop => "stop",
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Bid => "bid",
        Side::Ask => "ask",
    }
}

/// Endpoints are populated/cleared by the external session layer at
/// login/logout (`register_endpoint`/`unregister_endpoint`); the Order
/// Manager only ever calls `notify`.
pub struct TradeNotifier {
    endpoints: DashMap<String, SocketAddr>,
    sink: Box<dyn UnicastSink>,
}

impl TradeNotifier {
    pub fn new(sink: Box<dyn UnicastSink>) -> Self {
        Self {
            endpoints: DashMap::new(),
            sink,
        }
    }

    pub fn register_endpoint(&self, owner: &str, addr: SocketAddr) {
        self.endpoints.insert(owner.to_string(), addr);
    }

    pub fn unregister_endpoint(&self, owner: &str) {
        self.endpoints.remove(owner);
    }

    /// Delivers one `closedTrades` datagram to `order.owner` describing a
    /// fill against `counterparty`. Silently dropped if the owner has no
    /// registered endpoint; any send failure is logged and swallowed.
    pub fn notify(&self, order: &Order, counterparty: &str, size: i64, price: i64, timestamp: i64) {
        let Some(addr) = self.endpoints.get(&order.owner).map(|e| *e.value()) else {
            debug!(owner = %order.owner, "no registered endpoint, dropping trade notification");
            return;
        };

        let notification = ClosedTradesNotification {
            notification: "closedTrades",
            trades: vec![ClosedTrade {
                order_id: order.id.0,
                side: side_label(order.side),
                order_type: order_type_label(order.kind),
                size,
                price,
                counterparty: counterparty.to_string(),
                timestamp,
            }],
        };

        match serde_json::to_vec(&notification) {
            Ok(payload) => self.sink.send_to(addr, &payload),
            Err(e) => warn!(error = %e, "failed to serialize trade notification"),
        }
    }
}
