//! Engine error types.
//!
//! Mirrors the flat, hand-rolled `enum` + manual `Display` style used
//! throughout the order-book crates in this family rather than pulling in a
//! derive-macro error crate.

use std::fmt;

/// Errors raised by engine components. Order Manager callers translate
/// these into the numeric wire codes from spec.md section 6/7.
#[derive(Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// A request field failed basic validation (bad side, non-positive
    /// size, non-positive price, malformed month string, ...).
    Validation(String),

    /// A stop order's price is on the wrong side of the reference price.
    InvalidStopPrice {
        side: crate::types::Side,
        stop_price: i64,
        reference_price: i64,
    },

    /// A market order cannot be filled because the opposite side lacks
    /// sufficient resting liquidity.
    InsufficientLiquidity {
        side: crate::types::Side,
        requested: i64,
        available: i64,
    },

    /// `cancel` targeted an order that does not exist, belongs to another
    /// owner, or has already reached `remaining == 0`.
    OrderNotCancellable,

    /// The trade log could not be read or written. Always recoverable: the
    /// caller logs this and continues, it never aborts a fill.
    Persistence(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation error: {msg}"),
            EngineError::InvalidStopPrice {
                side,
                stop_price,
                reference_price,
            } => write!(
                f,
                "invalid stop price for {side:?}: stop={stop_price} reference={reference_price}"
            ),
            EngineError::InsufficientLiquidity {
                side,
                requested,
                available,
            } => write!(
                f,
                "insufficient liquidity for {side:?} market order: requested {requested}, available {available}"
            ),
            EngineError::OrderNotCancellable => {
                write!(f, "order not found, not owned by caller, or already filled")
            }
            EngineError::Persistence(msg) => write!(f, "trade log persistence error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
