//! Wire request/response shapes for the six operations in spec.md §6, plus
//! the session-endpoint stand-ins this bootstrap exposes in place of the
//! excluded session layer. Parsed once at the boundary per SPEC_FULL.md
//! §7/design note "Dynamic JSON value shuffling → typed records".

use engine::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct InsertLimitOrderRequest {
    #[serde(rename = "type")]
    pub side: Side,
    pub size: i64,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct InsertMarketOrderRequest {
    #[serde(rename = "type")]
    pub side: Side,
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct InsertStopOrderRequest {
    #[serde(rename = "type")]
    pub side: Side,
    pub size: i64,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(rename = "orderId")]
    pub order_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct GetPriceHistoryQuery {
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPriceAlertRequest {
    #[serde(rename = "thresholdPrice")]
    pub threshold_price: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSessionRequest {
    /// `host:port` to which trade-execution datagrams should be sent.
    pub addr: String,
}

#[derive(Debug, Serialize)]
pub struct OrderIdResponse {
    #[serde(rename = "orderId")]
    pub order_id: i64,
}

impl OrderIdResponse {
    pub fn rejected() -> Self {
        Self { order_id: -1 }
    }
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub response: i32,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl CodeResponse {
    pub fn ok() -> Self {
        Self {
            response: 100,
            error_message: String::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            response: 101,
            error_message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OhlcDayWire {
    pub date: String,
    #[serde(rename = "openPrice")]
    pub open_price: i64,
    #[serde(rename = "highPrice")]
    pub high_price: i64,
    #[serde(rename = "lowPrice")]
    pub low_price: i64,
    #[serde(rename = "closePrice")]
    pub close_price: i64,
}

impl From<engine::history::OhlcDay> for OhlcDayWire {
    fn from(d: engine::history::OhlcDay) -> Self {
        Self {
            date: d.date,
            open_price: d.open_price,
            high_price: d.high_price,
            low_price: d.low_price,
            close_price: d.close_price,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PriceHistoryResponse {
    Ok {
        month: String,
        #[serde(rename = "totalDays")]
        total_days: u32,
        #[serde(rename = "priceHistory")]
        price_history: Vec<OhlcDayWire>,
    },
    Err {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}
