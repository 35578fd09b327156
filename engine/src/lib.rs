//! Single-venue BTC/USD exchange engine: order book, price/time-priority
//! matcher, stop-order monitor, trade log, price history, and the two
//! notification producers.
//!
//! The front door is [`manager::OrderManager`]; everything else is a
//! building block it composes under one critical section.

pub mod book;
pub mod error;
pub mod history;
pub mod ids;
pub mod manager;
pub mod matching;
pub mod notify;
pub mod price;
pub mod stop_book;
pub mod trade_log;
pub mod types;

pub use error::EngineError;
pub use manager::OrderManager;
pub use types::{Order, OrderId, OrderKind, Side, Trade, TradeId};
