//! Ingestion pipeline for Hyperliquid node fill batches.
//!
//! One coordinator pass per trigger:
//! 1. Read the watermark (newest successful run's completion time)
//! 2. Enumerate block groups modified after it, capped per run
//! 3. Fetch each block's files (a failed block is skipped and retried on
//!    the next run, since the watermark never passes it)
//! 4. Parse, normalize, and deduplicate the combined batch
//! 5. Persist trades plus the run's bookkeeping row in one transaction
//!
//! Failures never leave partial state behind: a run either commits whole or
//! appends a `failed` bookkeeping row that keeps the watermark in place so
//! the same range is retried next trigger.
//!
//! ## Module organization
//!
//! - `parser` - newline-delimited JSON into loosely-typed fill records
//! - `normalizer` - canonical trade mapping, row-level validation drops
//! - `dedup` - natural-key deduplication within a run's batch
//! - `coordinator` - run orchestration, watermark and run-lock handling
//! - `error` - run error taxonomy

pub mod coordinator;
pub mod dedup;
pub mod error;
pub mod normalizer;
pub mod parser;

pub use coordinator::{IngestionCoordinator, IngestionReport};
pub use dedup::dedup_trades;
pub use error::IngestError;
pub use normalizer::{normalize_fills, NormalizedBatch};
pub use parser::{parse_fill_lines, RawFill};
