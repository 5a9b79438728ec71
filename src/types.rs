//! Canonical trade schema and ingestion-run bookkeeping types.
//!
//! Every fill that survives normalization becomes a [`Trade`]; every
//! coordinator invocation appends one [`IngestionRun`] row, success or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed source identifier stamped on every normalized trade.
pub const EXCHANGE: &str = "hyperliquid";

/// Trade side as normalized from the source encoding ("B"/"A").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
    /// Source encoding was not recognized.
    Unknown,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
            TradeSide::Unknown => "unknown",
        }
    }

    /// Map the source feed's side code: "B" = buy, "A" = sell.
    pub fn from_source(code: &str) -> Self {
        match code {
            "B" => TradeSide::Buy,
            "A" => TradeSide::Sell,
            _ => TradeSide::Unknown,
        }
    }

    /// Parse the stored representation back out of the database.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "buy" => TradeSide::Buy,
            "sell" => TradeSide::Sell,
            _ => TradeSide::Unknown,
        }
    }
}

/// A single executed fill in canonical form.
///
/// The surrogate row id is assigned by the store on insert and stays
/// internal to it; two fills are the same economic event when
/// (wallet_address, timestamp, asset, price, quantity) all match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub grouping_id: String,
    pub wallet_address: String,
    pub timestamp: DateTime<Utc>,
    pub asset: String,
    pub quantity: f64,
    pub price: f64,
    pub side: TradeSide,
    pub fee: f64,
    pub exchange: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    pub fn from_stored(value: &str) -> Self {
        match value {
            "success" => RunStatus::Success,
            _ => RunStatus::Failed,
        }
    }
}

/// One append-only bookkeeping row per coordinator invocation.
///
/// `last_ingestion_date` of the newest success row is the watermark for the
/// next run's object listing; failed rows never advance it.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionRun {
    pub last_ingestion_date: DateTime<Utc>,
    pub records_processed: i64,
    pub source_reference: Option<String>,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_maps_source_codes() {
        assert_eq!(TradeSide::from_source("B"), TradeSide::Buy);
        assert_eq!(TradeSide::from_source("A"), TradeSide::Sell);
        assert_eq!(TradeSide::from_source("X"), TradeSide::Unknown);
        assert_eq!(TradeSide::from_source(""), TradeSide::Unknown);
    }

    #[test]
    fn side_round_trips_through_storage() {
        for side in [TradeSide::Buy, TradeSide::Sell, TradeSide::Unknown] {
            assert_eq!(TradeSide::from_stored(side.as_str()), side);
        }
    }

    #[test]
    fn run_status_round_trips_through_storage() {
        assert_eq!(RunStatus::from_stored("success"), RunStatus::Success);
        assert_eq!(RunStatus::from_stored("failed"), RunStatus::Failed);
    }
}
