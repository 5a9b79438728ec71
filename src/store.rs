//! SQLite trade store: canonical `trades` table plus append-only
//! `ingestion_runs` bookkeeping, and the read queries served to API callers.
//!
//! The ingestion coordinator is the only writer; a run's rows land in one
//! transaction together with the run's bookkeeping row, so readers observe a
//! run atomically or not at all.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::types::{IngestionRun, RunStatus, Trade, TradeSide};

#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Io(std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Filters for the trade listing query. Unset fields do not constrain.
#[derive(Debug, Clone)]
pub struct TradeFilter {
    pub wallet_addresses: Vec<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub asset: Option<String>,
    pub grouping_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for TradeFilter {
    fn default() -> Self {
        Self {
            wallet_addresses: Vec::new(),
            start: None,
            end: None,
            asset: None,
            grouping_id: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Aggregated view of one order grouping (TWAP order).
#[derive(Debug, Clone, serde::Serialize)]
pub struct GroupSummary {
    pub grouping_id: String,
    pub total_trades: usize,
    pub total_volume: f64,
    /// Volume-weighted average price; 0 when total volume is 0.
    pub avg_price: f64,
    pub trades: Vec<Trade>,
}

/// Coarse ingestion health exposed to status callers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestionStatus {
    pub last_ingestion: Option<DateTime<Utc>>,
    pub total_records: i64,
    /// "success", "failed", or "no_data" when nothing has run yet.
    pub status: String,
    pub last_error: Option<String>,
}

/// SQLite-backed store for canonical trades and run bookkeeping.
pub struct TradeStore {
    conn: Arc<Mutex<Connection>>,
}

impl TradeStore {
    /// Open (or create) the database and apply the schema idempotently.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                grouping_id TEXT NOT NULL,
                wallet_address TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                asset TEXT NOT NULL,
                quantity REAL NOT NULL,
                price REAL NOT NULL,
                side TEXT NOT NULL,
                fee REAL NOT NULL DEFAULT 0,
                exchange TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_wallet_timestamp
             ON trades(wallet_address, timestamp)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_grouping_timestamp
             ON trades(grouping_id, timestamp)",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS ingestion_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                last_ingestion_date INTEGER NOT NULL,
                records_processed INTEGER NOT NULL DEFAULT 0,
                source_reference TEXT,
                status TEXT NOT NULL,
                error_message TEXT,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        log::info!("✅ Trade store initialized with WAL mode");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Watermark for the next ingestion run: completion time of the newest
    /// successful run. Failed runs never contribute.
    pub fn latest_successful_watermark(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let millis: Option<i64> = conn
            .query_row(
                "SELECT last_ingestion_date FROM ingestion_runs
                 WHERE status = 'success'
                 ORDER BY last_ingestion_date DESC
                 LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(millis.and_then(DateTime::<Utc>::from_timestamp_millis))
    }

    /// Persist one run's deduplicated batch.
    ///
    /// Bulk insert plus the success bookkeeping row commit as a single
    /// transaction; on any failure the whole run rolls back and the
    /// watermark is untouched.
    pub fn commit_run(
        &self,
        trades: &[Trade],
        source_reference: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO trades
                 (grouping_id, wallet_address, timestamp, asset, quantity, price, side, fee, exchange)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for trade in trades {
                stmt.execute(params![
                    trade.grouping_id,
                    trade.wallet_address,
                    trade.timestamp.timestamp_millis(),
                    trade.asset,
                    trade.quantity,
                    trade.price,
                    trade.side.as_str(),
                    trade.fee,
                    trade.exchange,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO ingestion_runs
             (last_ingestion_date, records_processed, source_reference, status, error_message, created_at)
             VALUES (?1, ?2, ?3, 'success', NULL, ?4)",
            params![
                completed_at.timestamp_millis(),
                trades.len() as i64,
                source_reference,
                Utc::now().timestamp_millis(),
            ],
        )?;

        tx.commit()?;
        log::info!("Bulk inserted {} records", trades.len());
        Ok(trades.len())
    }

    /// Record a failed run. Appends the bookkeeping row only; nothing else
    /// is written and the watermark stays where it was.
    pub fn record_failed_run(
        &self,
        error_message: &str,
        source_reference: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO ingestion_runs
             (last_ingestion_date, records_processed, source_reference, status, error_message, created_at)
             VALUES (?1, 0, ?2, 'failed', ?3, ?4)",
            params![
                at.timestamp_millis(),
                source_reference,
                error_message,
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Filtered trade listing, newest first, paginated.
    pub fn trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>, StoreError> {
        let mut sql = String::from(
            "SELECT grouping_id, wallet_address, timestamp, asset, quantity, price, side, fee, exchange
             FROM trades",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if !filter.wallet_addresses.is_empty() {
            let marks = vec!["?"; filter.wallet_addresses.len()].join(", ");
            clauses.push(format!("wallet_address IN ({})", marks));
            for wallet in &filter.wallet_addresses {
                values.push(Box::new(wallet.clone()));
            }
        }
        if let Some(start) = filter.start {
            clauses.push("timestamp >= ?".to_string());
            values.push(Box::new(start.timestamp_millis()));
        }
        if let Some(end) = filter.end {
            clauses.push("timestamp <= ?".to_string());
            values.push(Box::new(end.timestamp_millis()));
        }
        if let Some(asset) = &filter.asset {
            clauses.push("asset = ?".to_string());
            values.push(Box::new(asset.clone()));
        }
        if let Some(grouping_id) = &filter.grouping_id {
            clauses.push("grouping_id = ?".to_string());
            values.push(Box::new(grouping_id.clone()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY timestamp DESC LIMIT ? OFFSET ?");
        values.push(Box::new(filter.limit as i64));
        values.push(Box::new(filter.offset as i64));

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(values.iter().map(|v| v.as_ref())),
            Self::trade_from_row,
        )?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row?);
        }
        Ok(trades)
    }

    /// All trades for one grouping ID, aggregated: count, total volume,
    /// volume-weighted average price. None when the grouping is unknown.
    pub fn group_summary(&self, grouping_id: &str) -> Result<Option<GroupSummary>, StoreError> {
        let trades = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT grouping_id, wallet_address, timestamp, asset, quantity, price, side, fee, exchange
                 FROM trades WHERE grouping_id = ?1 ORDER BY timestamp ASC",
            )?;
            let rows = stmt.query_map([grouping_id], Self::trade_from_row)?;
            let mut trades = Vec::new();
            for row in rows {
                trades.push(row?);
            }
            trades
        };

        if trades.is_empty() {
            return Ok(None);
        }

        let total_volume: f64 = trades.iter().map(|t| t.quantity).sum();
        let avg_price = if total_volume > 0.0 {
            trades.iter().map(|t| t.price * t.quantity).sum::<f64>() / total_volume
        } else {
            0.0
        };

        Ok(Some(GroupSummary {
            grouping_id: grouping_id.to_string(),
            total_trades: trades.len(),
            total_volume,
            avg_price,
            trades,
        }))
    }

    /// Distinct grouping IDs a wallet has traded under, optionally bounded
    /// in time.
    pub fn wallet_grouping_ids(
        &self,
        wallet_address: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>, StoreError> {
        let mut sql =
            String::from("SELECT DISTINCT grouping_id FROM trades WHERE wallet_address = ?");
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(wallet_address.to_string())];
        if let Some(start) = start {
            sql.push_str(" AND timestamp >= ?");
            values.push(Box::new(start.timestamp_millis()));
        }
        if let Some(end) = end {
            sql.push_str(" AND timestamp <= ?");
            values.push(Box::new(end.timestamp_millis()));
        }

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter().map(|v| v.as_ref())), |row| {
            row.get::<_, String>(0)
        })?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Latest run's outcome plus the total persisted row count.
    pub fn ingestion_status(&self) -> Result<IngestionStatus, StoreError> {
        let latest = self.latest_run()?;
        let total_records = self.total_trades()?;

        Ok(match latest {
            Some(run) => IngestionStatus {
                last_ingestion: Some(run.last_ingestion_date),
                total_records,
                status: run.status.as_str().to_string(),
                last_error: run.error_message,
            },
            None => IngestionStatus {
                last_ingestion: None,
                total_records,
                status: "no_data".to_string(),
                last_error: None,
            },
        })
    }

    /// Most recent run row of either status, by creation time.
    pub fn latest_run(&self) -> Result<Option<IngestionRun>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let run = conn
            .query_row(
                "SELECT last_ingestion_date, records_processed, source_reference, status, error_message, created_at
                 FROM ingestion_runs ORDER BY created_at DESC, id DESC LIMIT 1",
                [],
                |row| {
                    let status: String = row.get(3)?;
                    Ok(IngestionRun {
                        last_ingestion_date: millis_to_datetime(row.get(0)?),
                        records_processed: row.get(1)?,
                        source_reference: row.get(2)?,
                        status: RunStatus::from_stored(&status),
                        error_message: row.get(4)?,
                        created_at: millis_to_datetime(row.get(5)?),
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    pub fn total_trades(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM trades", [], |row| row.get(0))?;
        Ok(count)
    }

    fn trade_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Trade> {
        let side: String = row.get(6)?;
        Ok(Trade {
            grouping_id: row.get(0)?,
            wallet_address: row.get(1)?,
            timestamp: millis_to_datetime(row.get(2)?),
            asset: row.get(3)?,
            quantity: row.get(4)?,
            price: row.get(5)?,
            side: TradeSide::from_stored(&side),
            fee: row.get(7)?,
            exchange: row.get(8)?,
        })
    }
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}
