//! Price History Service: groups the trade log by UTC calendar day within a
//! requested `MMYYYY` month and reduces each day to OHLC via the Price
//! Calculator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::price::compute_ohlc;
use crate::types::Trade;

/// One day's OHLC in the `getPriceHistory` wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcDay {
    /// `DD/MM/YYYY`.
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

/// Parses a strict `MMYYYY` string into `(month, year)`. Rejects anything
/// that is not exactly six ASCII digits or names a month outside `01..=12`.
pub fn parse_month(input: &str) -> Result<(u32, u32), EngineError> {
    if input.len() != 6 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::Validation(format!(
            "month must be exactly 6 digits in MMYYYY form, got {input:?}"
        )));
    }
    let month: u32 = input[0..2].parse().expect("validated all-digit prefix");
    let year: u32 = input[2..6].parse().expect("validated all-digit suffix");
    if !(1..=12).contains(&month) {
        return Err(EngineError::Validation(format!("month out of range: {month}")));
    }
    Ok((month, year))
}

/// Leap-year test kept deliberately Julian (divisible by 4, no century
/// exception) rather than Gregorian, see DESIGN.md open-question decision.
fn is_julian_leap_year(year: u32) -> bool {
    year % 4 == 0
}

/// Day count for `month` of `year` under the Julian leap rule above.
pub fn days_in_month(month: u32, year: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_julian_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => panic!("month out of range: {month}"),
    }
}

/// Converts a day count since the Unix epoch to a proleptic-Gregorian
/// `(year, month, day)` triple. Standard exact civil-calendar algorithm
/// (Howard Hinnant's `civil_from_days`); used only to recover the *actual*
/// calendar date of a trade, independent of the Julian day-count quirk
/// above, which applies solely to the reported month length.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if m <= 2 { y + 1 } else { y };
    (year, m, d)
}

/// Groups `trades` by UTC day within the named month and reduces each day
/// to OHLC, in ascending date order. Days with no trades are omitted
/// (see DESIGN.md open-question decision) rather than emitted zero-filled.
pub fn price_history(trades: &[Trade], month: &str) -> Result<Vec<OhlcDay>, EngineError> {
    let (month_num, year) = parse_month(month)?;

    let mut by_day: HashMap<u32, Vec<Trade>> = HashMap::new();
    for trade in trades {
        let epoch_day = trade.timestamp.div_euclid(86_400);
        let (y, m, d) = civil_from_days(epoch_day);
        if y == year as i64 && m == month_num {
            by_day.entry(d).or_default().push(trade.clone());
        }
    }

    let mut days: Vec<u32> = by_day.keys().copied().collect();
    days.sort_unstable();

    Ok(days
        .into_iter()
        .map(|d| {
            let label = format!("{d:02}/{month_num:02}/{year:04}");
            let ohlc = compute_ohlc(&by_day[&d], &label);
            OhlcDay {
                date: ohlc.date_label,
                open_price: ohlc.open,
                high_price: ohlc.high,
                low_price: ohlc.low,
                close_price: ohlc.close,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderId, TradeId};

    fn trade_at(ts: i64, price: i64, size: i64) -> Trade {
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
    fn parse_month_accepts_well_formed_input() {
        assert_eq!(parse_month("072026").unwrap(), (7, 2026));
    }

    #[test]
    fn parse_month_rejects_bad_shape() {
        assert!(parse_month("7-2026").is_err());
        assert!(parse_month("13").is_err());
        assert!(parse_month("132026").is_err());
        assert!(parse_month("002026").is_err());
    }

    #[test]
    fn julian_leap_rule_includes_century_years_gregorian_excludes() {
        assert_eq!(days_in_month(2, 1900), 29);
        assert_eq!(days_in_month(2, 2024), 29);
        assert_eq!(days_in_month(2, 2023), 28);
    }

    #[test]
    fn groups_trades_by_utc_day_within_month() {
        // 2026-07-27T00:00:00Z and 2026-07-27T23:00:00Z, plus one in August.
        let july_27_start = 1_785_110_400;
        let july_27_late = july_27_start + 23 * 3600;
        let august_1 = 1_785_542_400;

        let trades = vec![
            trade_at(july_27_start, 58_000_000, 1000),
            trade_at(july_27_late, 58_500_000, 500),
            trade_at(august_1, 60_000_000, 100),
        ];

        let history = price_history(&trades, "072026").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].date, "27/07/2026");
        assert_eq!(history[0].open_price, 58_000_000);
        assert_eq!(history[0].close_price, 58_500_000);
    }

    #[test]
    fn empty_month_yields_empty_history() {
        assert!(price_history(&[], "012026").unwrap().is_empty());
    }
}
