//! Per-user one-shot price threshold alerts, delivered to a shared
//! multicast group.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Abstracts the actual multicast transport so the notifier stays testable
/// without joining a real group; production wiring is `UdpMulticastSink` in
/// `exchange-service`.
pub trait MulticastSink: Send + Sync {
    fn publish(&self, payload: &[u8]);
}

/// Drops every payload. Used where no alerting is configured.
pub struct NullSink;

impl MulticastSink for NullSink {
    fn publish(&self, _payload: &[u8]) {}
}

#[derive(Debug, Clone, Serialize)]
struct ThresholdAlert<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    username: &'a str,
    #[serde(rename = "thresholdPrice")]
    threshold_price: i64,
    #[serde(rename = "currentPrice")]
    current_price: i64,
    message: String,
    timestamp: i64,
}

/// At most one active threshold per actor (spec.md: "last write wins" on a
/// duplicate `registerPriceAlert`); fires and unregisters on the first
/// price update that reaches or exceeds it.
pub struct ThresholdNotifier {
    thresholds: DashMap<String, i64>,
    sink: Arc<dyn MulticastSink>,
}

impl ThresholdNotifier {
    pub fn new(sink: Arc<dyn MulticastSink>) -> Self {
        Self {
            thresholds: DashMap::new(),
            sink,
        }
    }

    /// Replaces any prior threshold for this actor.
    pub fn register(&self, actor: &str, threshold: i64) {
        self.thresholds.insert(actor.to_string(), threshold);
    }

    pub fn unregister(&self, actor: &str) {
        self.thresholds.remove(actor);
    }

    /// Fires (and unregisters) every threshold reached or crossed upward by
    /// `new_price`. Each candidate is removed with a compare-and-remove so a
    /// concurrent `on_price` call can never fire the same registration
    /// twice. Iteration order across a single call is unspecified.
    pub fn on_price(&self, new_price: i64, now_ms: i64) {
        let candidates: Vec<String> = self.thresholds.iter().map(|e| e.key().clone()).collect();

        for actor in candidates {
            let fired = self
                .thresholds
                .remove_if(&actor, |_, threshold| new_price >= *threshold);

            if let Some((actor, threshold)) = fired {
                let alert = ThresholdAlert {
                    kind: "priceThreshold",
                    username: &actor,
                    threshold_price: threshold,
                    current_price: new_price,
                    message: format!(
                        "price reached {new_price} millis, at or above your threshold of {threshold} millis"
                    ),
                    timestamp: now_ms,
                };
                match serde_json::to_vec(&alert) {
                    Ok(payload) => {
                        debug!(actor = %actor, threshold, new_price, "firing threshold alert");
                        self.sink.publish(&payload);
                    }
                    Err(e) => warn!(error = %e, "failed to serialize threshold alert"),
                }
            }
        }
    }
}
