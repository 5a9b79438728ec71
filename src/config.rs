//! Runtime configuration from environment variables.

use std::env;

/// Application configuration.
///
/// Loaded once at startup from environment variables with sensible defaults;
/// `.env` files are honored by the binaries before this is read.
#[derive(Debug, Clone)]
pub struct Config {
    /// S3 bucket holding node fill batches
    pub s3_bucket_name: String,

    /// AWS region for the bucket
    pub s3_region: String,

    /// Key prefix under which fill batches are published
    pub s3_prefix: String,

    /// Requester-pays billing mode ("requester" enables the header)
    pub s3_request_payer: String,

    /// Optional static credentials; absent means unsigned (anonymous) access
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,

    /// Path to the SQLite trade store
    pub database_path: String,

    /// Maximum block groups fetched per ingestion run
    pub max_blocks_per_run: usize,

    /// Per-object fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Daily scheduler switch and UTC fire time
    pub scheduler_enabled: bool,
    pub scheduler_hour: u32,
    pub scheduler_minute: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `S3_BUCKET_NAME` (default: hl-mainnet-node-data)
    /// - `S3_REGION` (default: us-east-1)
    /// - `S3_PREFIX` (default: node_fills_by_block/)
    /// - `S3_REQUEST_PAYER` (default: requester)
    /// - `S3_ACCESS_KEY_ID` / `S3_SECRET_ACCESS_KEY` (default: unset)
    /// - `DATABASE_PATH` (default: hl_twap.db)
    /// - `MAX_BLOCKS_PER_RUN` (default: 100)
    /// - `FETCH_TIMEOUT_SECS` (default: 300)
    /// - `SCHEDULER_ENABLED` (default: true)
    /// - `SCHEDULER_HOUR` / `SCHEDULER_MINUTE` (default: 02:00 UTC)
    pub fn from_env() -> Self {
        Self {
            s3_bucket_name: env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "hl-mainnet-node-data".to_string()),

            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),

            s3_prefix: env::var("S3_PREFIX")
                .unwrap_or_else(|_| "node_fills_by_block/".to_string()),

            s3_request_payer: env::var("S3_REQUEST_PAYER")
                .unwrap_or_else(|_| "requester".to_string()),

            s3_access_key_id: env::var("S3_ACCESS_KEY_ID").ok(),

            s3_secret_access_key: env::var("S3_SECRET_ACCESS_KEY").ok(),

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "hl_twap.db".to_string()),

            max_blocks_per_run: env::var("MAX_BLOCKS_PER_RUN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),

            fetch_timeout_secs: env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),

            scheduler_enabled: env::var("SCHEDULER_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),

            scheduler_hour: env::var("SCHEDULER_HOUR")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|h: u32| h.min(23))
                .unwrap_or(2),

            scheduler_minute: env::var("SCHEDULER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|m: u32| m.min(59))
                .unwrap_or(0),
        }
    }
}
