//! Cross-batch deduplication over the natural fill key.

use std::collections::HashSet;

use crate::types::Trade;

/// Natural key identifying one economic fill event. Deliberately omits
/// grouping_id, side, and fee: two fills matching on these five fields are
/// the same event even if the rest disagrees.
#[derive(Hash, PartialEq, Eq)]
struct FillKey {
    wallet_address: String,
    timestamp_ms: i64,
    asset: String,
    // f64 compared by bit pattern; both duplicates come from the same
    // string parse, so equal values have equal bits.
    price_bits: u64,
    quantity_bits: u64,
}

impl FillKey {
    fn of(trade: &Trade) -> Self {
        Self {
            wallet_address: trade.wallet_address.clone(),
            timestamp_ms: trade.timestamp.timestamp_millis(),
            asset: trade.asset.clone(),
            price_bits: trade.price.to_bits(),
            quantity_bits: trade.quantity.to_bits(),
        }
    }
}

/// Remove duplicate fills across one run's combined batch.
///
/// First occurrence in arrival order wins; order is otherwise preserved.
/// Operates only within the batch at hand, never against previously
/// persisted rows.
pub fn dedup_trades(trades: Vec<Trade>) -> Vec<Trade> {
    let total = trades.len();
    let mut seen = HashSet::with_capacity(total);
    let mut unique = Vec::with_capacity(total);

    for trade in trades {
        if seen.insert(FillKey::of(&trade)) {
            unique.push(trade);
        }
    }

    if unique.len() < total {
        log::info!("After deduplication: {} records ({} removed)", unique.len(), total - unique.len());
    }
    unique
}
