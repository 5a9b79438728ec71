//! hlflow: Hyperliquid TWAP fill ingestion.
//!
//! Fetches node fill batches from S3, normalizes them into a canonical trade
//! schema, deduplicates, and persists them to a SQLite store that serves
//! per-grouping (TWAP) and per-wallet queries. See the `pipeline` module for
//! the run semantics.
//!
//! Running `hlflow` itself performs one manual ingestion pass; the
//! `ingest_runtime` binary is the scheduled production entry point.

#[cfg(test)]
mod tests;

pub mod config;
pub mod fetcher;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod types;

pub use config::Config;
pub use pipeline::{IngestError, IngestionCoordinator, IngestionReport};
pub use store::{GroupSummary, IngestionStatus, StoreError, TradeFilter, TradeStore};
pub use types::{IngestionRun, RunStatus, Trade, TradeSide, EXCHANGE};

use std::sync::Arc;

use fetcher::S3ObjectStore;

/// One-shot ingestion pass for manual and out-of-band runs.
///
/// Safe alongside the scheduled runtime: a pass only lists past the stored
/// watermark, so re-invocation against committed ranges persists nothing.
#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store = Arc::new(TradeStore::open(&config.database_path)?);
    let object_store = Arc::new(S3ObjectStore::connect(&config).await);
    let coordinator =
        IngestionCoordinator::new(object_store, store.clone(), config.max_blocks_per_run);

    log::info!("Starting manual ingestion pass...");
    match coordinator.run_ingestion_pass().await {
        Ok(report) => {
            log::info!(
                "✅ Ingestion pass completed: {} records processed",
                report.records_processed
            );
            let status = store.ingestion_status()?;
            log::info!(
                "   └─ Store now holds {} trades (latest run: {})",
                status.total_records,
                status.status
            );
            Ok(())
        }
        Err(err) => {
            log::error!("❌ Ingestion pass failed: {}", err);
            Err(err.into())
        }
    }
}
