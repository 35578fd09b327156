//! Notification producers: per-counterparty trade notices and multicast
//! price-threshold alerts. Both are best-effort, no-ack, no-retry channels.

pub mod threshold;
pub mod trade;

pub use threshold::{MulticastSink, ThresholdNotifier};
pub use trade::{TradeNotifier, UnicastSink};
