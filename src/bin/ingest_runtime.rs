//! Ingestion Runtime - production entry point
//!
//! Wires the composition root:
//! - Loads configuration from environment
//! - Opens the SQLite trade store (schema applied idempotently)
//! - Connects the S3 object store client
//! - Spawns the daily ingestion scheduler
//!
//! Usage:
//!   cargo run --release --bin ingest_runtime
//!
//! Environment variables:
//!   S3_BUCKET_NAME / S3_REGION / S3_PREFIX / S3_REQUEST_PAYER - bucket access
//!   DATABASE_PATH - SQLite store path (default: hl_twap.db)
//!   SCHEDULER_ENABLED - master switch (default: true)
//!   SCHEDULER_HOUR / SCHEDULER_MINUTE - daily UTC fire time (default: 02:00)

use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;

use hlflow::config::Config;
use hlflow::fetcher::S3ObjectStore;
use hlflow::pipeline::IngestionCoordinator;
use hlflow::store::TradeStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("🚀 Starting Hyperliquid fill ingestion runtime...");

    let config = Config::from_env();

    if !config.scheduler_enabled {
        info!("⚠️  Scheduler is DISABLED (set SCHEDULER_ENABLED=true to activate)");
        info!("   └─ Exiting gracefully...");
        return Ok(());
    }

    info!("📊 Configuration:");
    info!("   ├─ Bucket: {} ({})", config.s3_bucket_name, config.s3_region);
    info!("   ├─ Prefix: {}", config.s3_prefix);
    info!("   ├─ Request payer: {}", config.s3_request_payer);
    info!("   ├─ Database: {}", config.database_path);
    info!("   ├─ Max blocks per run: {}", config.max_blocks_per_run);
    info!(
        "   └─ Daily ingestion at {:02}:{:02} UTC",
        config.scheduler_hour, config.scheduler_minute
    );

    let store = Arc::new(TradeStore::open(&config.database_path)?);
    info!("✅ Trade store ready");

    let object_store = Arc::new(S3ObjectStore::connect(&config).await);
    info!("✅ Object store client connected");

    let coordinator = Arc::new(IngestionCoordinator::new(
        object_store,
        store,
        config.max_blocks_per_run,
    ));

    let scheduler_coordinator = coordinator.clone();
    tokio::spawn(async move {
        hlflow::scheduler::daily_ingestion_task(
            scheduler_coordinator,
            config.scheduler_hour,
            config.scheduler_minute,
        )
        .await;
    });

    info!("🔄 Press CTRL+C to shutdown");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
        Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
    }

    info!("✅ Ingestion runtime stopped");
    Ok(())
}
