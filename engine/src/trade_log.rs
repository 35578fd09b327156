//! Durable, append-only persistence of executed trades.
//!
//! The whole file is rewritten on every append. At the scale of a single
//! instrument's trade tape this is simpler than incremental writers and
//! keeps the on-disk shape trivially recoverable after a crash: there is
//! never a partially-written trailing record.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::EngineError;
use crate::types::{OrderId, Trade, TradeId};

#[derive(Serialize, Deserialize)]
struct Envelope {
    trades: Vec<PersistedTrade>,
}

/// On-disk shape of a trade record, distinct from the in-memory `Trade` so
/// the wire/persistence format can evolve independently of it.
#[derive(Serialize, Deserialize)]
struct PersistedTrade {
    #[serde(rename = "orderId")]
    order_id: u64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "orderType")]
    order_type: String,
    size: i64,
    price: i64,
    timestamp: i64,
    #[serde(rename = "bidOrderId")]
    bid_order_id: u64,
    #[serde(rename = "askOrderId")]
    ask_order_id: u64,
    #[serde(rename = "bidUsername")]
    bid_username: String,
    #[serde(rename = "askUsername")]
    ask_username: String,
}

impl From<&Trade> for PersistedTrade {
    fn from(t: &Trade) -> Self {
        PersistedTrade {
            order_id: t.trade_id.0,
            kind: "executed".to_string(),
            order_type: "completed".to_string(),
            size: t.size,
            price: t.price,
            timestamp: t.timestamp,
            bid_order_id: t.bid_order_id.0,
            ask_order_id: t.ask_order_id.0,
            bid_username: t.bid_owner.clone(),
            ask_username: t.ask_owner.clone(),
        }
    }
}

impl From<PersistedTrade> for Trade {
    fn from(p: PersistedTrade) -> Self {
        Trade {
            trade_id: TradeId(p.order_id),
            bid_order_id: OrderId(p.bid_order_id),
            ask_order_id: OrderId(p.ask_order_id),
            bid_owner: p.bid_username,
            ask_owner: p.ask_username,
            size: p.size,
            price: p.price,
            timestamp: p.timestamp,
        }
    }
}

/// Aggregate counters over the whole log, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeLogStats {
    pub total_trades: u64,
    pub total_volume: i64,
}

pub struct TradeLog {
    path: PathBuf,
    lock: RwLock<()>,
}

impl TradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    /// Ensures the parent directory and file exist; writes an empty
    /// envelope if the file is absent. Idempotent.
    pub fn init(&self) -> Result<(), EngineError> {
        let _guard = self.lock.write().expect("trade log lock poisoned");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| EngineError::Persistence(e.to_string()))?;
            }
        }
        if !self.path.exists() {
            self.write_envelope(&Envelope { trades: Vec::new() })?;
        }
        Ok(())
    }

    /// Returns trades in file order. On parse failure logs and returns an
    /// empty list rather than propagating, a corrupt tape must not stop
    /// the engine from matching.
    pub fn load_all(&self) -> Vec<Trade> {
        let _guard = self.lock.read().expect("trade log lock poisoned");
        match self.read_envelope(&self.path) {
            Ok(envelope) => envelope.trades.into_iter().map(Trade::from).collect(),
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "failed to load trade log, returning empty history");
                Vec::new()
            }
        }
    }

    /// Serialized with the write lock held: loads the current envelope,
    /// appends, and rewrites the whole file. Readers during this window see
    /// either the pre- or post-append state, never a partial one, because
    /// the rewrite happens under the same lock the reader takes.
    pub fn append(&self, trade: &Trade) -> Result<(), EngineError> {
        let _guard = self.lock.write().expect("trade log lock poisoned");
        let mut envelope = self.read_envelope(&self.path).unwrap_or(Envelope { trades: Vec::new() });
        envelope.trades.push(PersistedTrade::from(trade));
        self.write_envelope(&envelope)
    }

    pub fn stats(&self) -> TradeLogStats {
        let trades = self.load_all();
        TradeLogStats {
            total_trades: trades.len() as u64,
            total_volume: trades.iter().map(|t| t.size).sum(),
        }
    }

    fn read_envelope(&self, path: &Path) -> Result<Envelope, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| EngineError::Persistence(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| EngineError::Persistence(e.to_string()))
    }

    fn write_envelope(&self, envelope: &Envelope) -> Result<(), EngineError> {
        let json =
            serde_json::to_string_pretty(envelope).map_err(|e| EngineError::Persistence(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| EngineError::Persistence(e.to_string()))
    }
}
