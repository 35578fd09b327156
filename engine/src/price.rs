//! Pure, stateless price/size formatting and OHLC reduction.

use serde::{Deserialize, Serialize};

use crate::types::{Side, Trade};

/// `priceInMillis / 1000`, thousands-separated, zero decimals.
pub fn format_price(millis: i64) -> String {
    let units = millis / 1000;
    thousands_separate(units)
}

/// `sizeInMillis / 1000`, three decimal places.
pub fn format_size(millis: i64) -> String {
    let whole = millis / 1000;
    let frac = (millis % 1000).abs();
    format!("{whole}.{frac:03}")
}

fn thousands_separate(mut value: i64) -> String {
    let negative = value < 0;
    if negative {
        value = -value;
    }
    let digits = value.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Strict at submission: a stop order placed exactly at the reference price
/// is rejected here even though `StopBook::activate` would trigger on that
/// same price non-strictly (see DESIGN.md open-question decision).
pub fn is_valid_stop_price(side: Side, stop_price: i64, reference_price: i64) -> bool {
    match side {
        Side::Bid => stop_price > reference_price,
        Side::Ask => stop_price < reference_price,
    }
}

/// One day's open/high/low/close/volume/count over a set of trades.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ohlc {
    pub date_label: String,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
    pub count: u64,
}

/// `trades_of_day` is assumed to already be filtered to one calendar day; it
/// need not be pre-sorted by timestamp, chronological order is recovered
/// here for `open`/`close`. Ties (equal timestamps) keep input order.
pub fn compute_ohlc(trades_of_day: &[Trade], date_label: &str) -> Ohlc {
    if trades_of_day.is_empty() {
        return Ohlc {
            date_label: date_label.to_string(),
            open: 0,
            high: 0,
            low: 0,
            close: 0,
            volume: 0,
            count: 0,
        };
    }

    let mut ordered: Vec<&Trade> = trades_of_day.iter().collect();
    ordered.sort_by_key(|t| t.timestamp);

    let open = ordered.first().unwrap().price;
    let close = ordered.last().unwrap().price;
    let high = trades_of_day.iter().map(|t| t.price).max().unwrap();
    let low = trades_of_day.iter().map(|t| t.price).min().unwrap();
    let volume: i64 = trades_of_day.iter().map(|t| t.size).sum();

    Ohlc {
        date_label: date_label.to_string(),
        open,
        high,
        low,
        close,
        volume,
        count: trades_of_day.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, TradeId};

    fn trade(price: i64, size: i64, ts: i64) -> Trade {
        Trade {
            trade_id: TradeId(1),
            bid_order_id: OrderId(1),
            ask_order_id: OrderId(2),
            bid_owner: "bob".into(),
            ask_owner: "alice".into(),
            size,
            price,
            timestamp: ts,
        }
    }

    #[test]
    fn format_price_groups_thousands() {
        assert_eq!(format_price(58_000_000), "58,000");
        assert_eq!(format_price(999_000), "999");
        assert_eq!(format_price(1_234_000_000), "1,234,000");
    }

    #[test]
    fn format_size_keeps_three_decimals() {
        assert_eq!(format_size(1000), "1.000");
        assert_eq!(format_size(1500), "1.500");
        assert_eq!(format_size(500), "0.500");
    }

    #[test]
    fn stop_validity_is_strict_and_side_aware() {
        assert!(is_valid_stop_price(Side::Bid, 58_500_000, 58_000_000));
        assert!(!is_valid_stop_price(Side::Bid, 58_000_000, 58_000_000));
        assert!(is_valid_stop_price(Side::Ask, 57_500_000, 58_000_000));
        assert!(!is_valid_stop_price(Side::Ask, 58_000_000, 58_000_000));
    }

    #[test]
    fn ohlc_of_empty_set_is_zeroed_but_labelled() {
        let ohlc = compute_ohlc(&[], "2026-07-27");
        assert_eq!(
            ohlc,
            Ohlc {
                date_label: "2026-07-27".into(),
                open: 0,
                high: 0,
                low: 0,
                close: 0,
                volume: 0,
                count: 0,
            }
        );
    }

    #[test]
    fn ohlc_picks_chronological_open_and_close() {
        let trades = vec![trade(100, 5, 300), trade(90, 2, 100), trade(110, 3, 200)];
        let ohlc = compute_ohlc(&trades, "d");
        assert_eq!(ohlc.open, 90);
        assert_eq!(ohlc.close, 100);
        assert_eq!(ohlc.high, 110);
        assert_eq!(ohlc.low, 90);
        assert_eq!(ohlc.volume, 10);
        assert_eq!(ohlc.count, 3);
    }
}
