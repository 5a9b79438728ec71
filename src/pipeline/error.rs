//! Error taxonomy for an ingestion run.

use crate::fetcher::FetchError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum IngestError {
    /// Network or object-store failure while listing or fetching.
    Transport(String),
    /// Object content did not match its declared codec.
    Decompression { key: String, message: String },
    /// An object's newline-delimited JSON was malformed. Fails the whole
    /// object, and with it the run: persisting a partial range would let the
    /// watermark advance past fills that were never stored.
    Parse {
        key: String,
        line: usize,
        message: String,
    },
    /// Database failure; fatal to the run, watermark unchanged.
    Persistence(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Transport(m) => write!(f, "Transport error: {}", m),
            IngestError::Decompression { key, message } => {
                write!(f, "Decompression error for {}: {}", key, message)
            }
            IngestError::Parse { key, line, message } => {
                write!(f, "Parse error in {} line {}: {}", key, line, message)
            }
            IngestError::Persistence(m) => write!(f, "Persistence error: {}", m),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<FetchError> for IngestError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transport(m) => IngestError::Transport(m),
            FetchError::Decompression { key, message } => {
                IngestError::Decompression { key, message }
            }
        }
    }
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        IngestError::Persistence(err.to_string())
    }
}
