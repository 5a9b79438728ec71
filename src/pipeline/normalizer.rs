//! Canonicalization of raw fill records.
//!
//! Maps the source feed's field names and encodings onto the canonical
//! [`Trade`] schema:
//!
//! | source | canonical       | transform                                  |
//! |--------|-----------------|--------------------------------------------|
//! | user   | wallet_address  | copy                                       |
//! | coin   | asset           | copy                                       |
//! | px     | price           | numeric parse; non-numeric drops the row   |
//! | sz     | quantity        | numeric parse; non-numeric drops the row   |
//! | time   | timestamp       | epoch milliseconds to UTC instant          |
//! | oid    | grouping_id     | stringify                                  |
//! | side   | side            | "B" buy, "A" sell, anything else unknown   |
//! | fee    | fee             | numeric parse; missing/non-numeric to 0    |
//!
//! Rows missing wallet_address, timestamp, or asset are dropped and counted,
//! never fatal: partial garbage in a large batch must not abort ingestion of
//! the rest.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::parser::RawFill;
use crate::types::{Trade, TradeSide, EXCHANGE};

/// Result of normalizing one run's combined batch.
#[derive(Debug)]
pub struct NormalizedBatch {
    pub trades: Vec<Trade>,
    /// Rows excluded for missing required fields or unparsable numbers.
    pub dropped: usize,
}

/// Normalize a batch of raw fills, dropping invalid rows.
pub fn normalize_fills(raws: Vec<RawFill>) -> NormalizedBatch {
    let total = raws.len();
    let mut trades = Vec::with_capacity(total);

    for raw in &raws {
        if let Some(trade) = normalize_one(raw) {
            trades.push(trade);
        }
    }

    let dropped = total - trades.len();
    if dropped > 0 {
        log::warn!("Dropped {} of {} fills during normalization", dropped, total);
    }
    log::info!("Normalized to {} valid records", trades.len());

    NormalizedBatch { trades, dropped }
}

fn normalize_one(raw: &RawFill) -> Option<Trade> {
    let wallet_address = raw.get("user").and_then(Value::as_str)?.to_string();
    let asset = raw.get("coin").and_then(Value::as_str)?.to_string();
    let timestamp = raw
        .get("time")
        .and_then(as_epoch_millis)
        .and_then(DateTime::<Utc>::from_timestamp_millis)?;
    let price = raw.get("px").and_then(as_f64)?;
    let quantity = raw.get("sz").and_then(as_f64)?;

    let grouping_id = raw.get("oid").map(stringify).unwrap_or_default();
    let side = raw
        .get("side")
        .and_then(Value::as_str)
        .map(TradeSide::from_source)
        .unwrap_or(TradeSide::Unknown);
    let fee = raw.get("fee").and_then(as_f64).unwrap_or(0.0);

    Some(Trade {
        grouping_id,
        wallet_address,
        timestamp,
        asset,
        quantity,
        price,
        side,
        fee,
        exchange: EXCHANGE.to_string(),
    })
}

/// Numeric parse accepting both JSON numbers and numeric strings; the feed
/// serializes px/sz/fee as strings. Sign-preserving.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_fill(value: serde_json::Value) -> RawFill {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn full_fill() -> RawFill {
        raw_fill(json!({
            "user": "0xabc",
            "coin": "BTC",
            "px": "45000.0",
            "sz": "1.5",
            "side": "B",
            "time": 1704110400000i64,
            "oid": 12345,
            "fee": "10.0",
            "startPosition": "0.0",
            "dir": "Open Long",
            "crossed": true
        }))
    }

    #[test]
    fn maps_all_fields() {
        let batch = normalize_fills(vec![full_fill()]);
        assert_eq!(batch.dropped, 0);
        let trade = &batch.trades[0];
        assert_eq!(trade.wallet_address, "0xabc");
        assert_eq!(trade.asset, "BTC");
        assert_eq!(trade.price, 45000.0);
        assert_eq!(trade.quantity, 1.5);
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.grouping_id, "12345");
        assert_eq!(trade.fee, 10.0);
        assert_eq!(trade.exchange, "hyperliquid");
        assert_eq!(trade.timestamp.timestamp_millis(), 1704110400000);
    }

    #[test]
    fn timestamp_is_utc() {
        let batch = normalize_fills(vec![full_fill()]);
        // 1704110400000 ms = 2024-01-01T12:00:00Z
        assert_eq!(
            batch.trades[0].timestamp.to_rfc3339(),
            "2024-01-01T12:00:00+00:00"
        );
    }

    #[test]
    fn side_codes_map_to_buy_sell_unknown() {
        for (code, expected) in [
            (json!("B"), TradeSide::Buy),
            (json!("A"), TradeSide::Sell),
            (json!("Z"), TradeSide::Unknown),
            (json!(7), TradeSide::Unknown),
        ] {
            let mut fill = full_fill();
            fill.insert("side".to_string(), code);
            let batch = normalize_fills(vec![fill]);
            assert_eq!(batch.trades[0].side, expected);
        }
    }

    #[test]
    fn missing_side_is_unknown() {
        let mut fill = full_fill();
        fill.remove("side");
        let batch = normalize_fills(vec![fill]);
        assert_eq!(batch.trades[0].side, TradeSide::Unknown);
    }

    #[test]
    fn missing_required_fields_drop_the_row() {
        for field in ["user", "coin", "time"] {
            let mut fill = full_fill();
            fill.remove(field);
            let batch = normalize_fills(vec![fill, full_fill()]);
            assert_eq!(batch.dropped, 1, "removing {} should drop one row", field);
            assert_eq!(batch.trades.len(), 1);
        }
    }

    #[test]
    fn unparsable_amounts_drop_the_row() {
        for field in ["px", "sz"] {
            let mut fill = full_fill();
            fill.insert(field.to_string(), json!("not a number"));
            let batch = normalize_fills(vec![fill]);
            assert_eq!(batch.dropped, 1, "bad {} should drop the row", field);
        }
    }

    #[test]
    fn fee_defaults_to_zero_when_missing_or_unparsable() {
        let mut without_fee = full_fill();
        without_fee.remove("fee");
        let mut bad_fee = full_fill();
        bad_fee.insert("fee".to_string(), json!("USDC"));

        let batch = normalize_fills(vec![without_fee, bad_fee]);
        assert_eq!(batch.dropped, 0);
        assert_eq!(batch.trades[0].fee, 0.0);
        assert_eq!(batch.trades[1].fee, 0.0);
    }

    #[test]
    fn numeric_parse_preserves_sign() {
        let mut fill = full_fill();
        fill.insert("fee".to_string(), json!("-0.25"));
        let batch = normalize_fills(vec![fill]);
        assert_eq!(batch.trades[0].fee, -0.25);
    }

    #[test]
    fn amounts_accept_json_numbers() {
        let mut fill = full_fill();
        fill.insert("px".to_string(), json!(45000.5));
        fill.insert("sz".to_string(), json!(2));
        let batch = normalize_fills(vec![fill]);
        assert_eq!(batch.trades[0].price, 45000.5);
        assert_eq!(batch.trades[0].quantity, 2.0);
    }

    #[test]
    fn string_oid_is_copied_verbatim() {
        let mut fill = full_fill();
        fill.insert("oid".to_string(), json!("order-77"));
        let batch = normalize_fills(vec![fill]);
        assert_eq!(batch.trades[0].grouping_id, "order-77");
    }

    #[test]
    fn empty_batch_is_empty() {
        let batch = normalize_fills(Vec::new());
        assert!(batch.trades.is_empty());
        assert_eq!(batch.dropped, 0);
    }
}
