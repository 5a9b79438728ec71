//! S3 listing and fetching with requester-pays support and codec detection.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::types::RequestPayer;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::timeout;

use super::codec::decompress_for_key;
use crate::config::Config;

#[derive(Debug)]
pub enum FetchError {
    /// Network or object-store failure, including fetch timeouts.
    Transport(String),
    /// Object content did not match the codec implied by its key suffix.
    Decompression { key: String, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(m) => write!(f, "Transport error: {}", m),
            FetchError::Decompression { key, message } => {
                write!(f, "Decompression error for {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Listing entry for one remote object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
}

/// Read-only access to the fill bucket.
///
/// `list` and `fetch` are the primitive operations; block enumeration and
/// block fetching are derived from them, so alternative backends (tests use
/// an in-memory one) only implement the primitives.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Root key prefix under which fill batches live.
    fn prefix(&self) -> &str;

    /// Enumerate objects under `prefix` whose modification time falls in
    /// `(after, before]`; unbounded where a bound is absent. Paginates
    /// internally, returns the accumulated listing.
    async fn list(
        &self,
        prefix: &str,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ObjectInfo>, FetchError>;

    /// Retrieve one object's content, decompressed per its key suffix.
    /// No internal retry; retry policy belongs to the coordinator.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError>;

    /// Distinct block-group prefixes (second-level key segment) modified in
    /// the given range, ascending by prefix string. Block identifiers are
    /// monotonically increasing numeric strings, so the string order is a
    /// chronological proxy.
    async fn list_blocks_in_range(
        &self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<String>, FetchError> {
        let objects = self.list(self.prefix(), after, before).await?;
        let mut blocks = BTreeSet::new();
        for obj in objects {
            let mut parts = obj.key.splitn(3, '/');
            if let (Some(root), Some(block)) = (parts.next(), parts.next()) {
                if !block.is_empty() {
                    blocks.insert(format!("{}/{}/", root, block));
                }
            }
        }
        Ok(blocks.into_iter().collect())
    }

    /// Fetch every non-directory object under a block prefix. A failure on
    /// any one object aborts the whole block fetch.
    async fn fetch_block(&self, block_prefix: &str) -> Result<Vec<(String, Vec<u8>)>, FetchError> {
        let objects = self.list(block_prefix, None, None).await?;
        let mut files = Vec::with_capacity(objects.len());
        for obj in objects {
            if obj.key.ends_with('/') {
                continue; // directory marker
            }
            let content = self.fetch(&obj.key).await.map_err(|e| match e {
                FetchError::Transport(m) => {
                    FetchError::Transport(format!("block {}: {}", block_prefix, m))
                }
                other => other,
            })?;
            files.push((obj.key, content));
        }
        log::info!("Fetched {} files from block {}", files.len(), block_prefix);
        Ok(files)
    }
}

/// S3-backed implementation.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    prefix: String,
    request_payer: Option<RequestPayer>,
    fetch_timeout: Duration,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// With access keys configured the client signs with those static
    /// credentials; without them it runs unsigned, which is how the public
    /// node-data buckets are reachable.
    pub async fn connect(config: &Config) -> Self {
        let region = Region::new(config.s3_region.clone());

        let client = match (&config.s3_access_key_id, &config.s3_secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials =
                    Credentials::new(key_id.clone(), secret.clone(), None, None, "hlflow");
                let s3_config = aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
                    .build();
                Client::from_conf(s3_config)
            }
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .no_credentials()
                    .load()
                    .await;
                Client::new(&shared)
            }
        };

        let request_payer = match config.s3_request_payer.as_str() {
            "requester" => Some(RequestPayer::Requester),
            _ => None,
        };

        Self {
            client,
            bucket: config.s3_bucket_name.clone(),
            prefix: config.s3_prefix.clone(),
            request_payer,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn list(
        &self,
        prefix: &str,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<ObjectInfo>, FetchError> {
        log::info!("Listing objects in bucket {} with prefix {}", self.bucket, prefix);

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_request_payer(self.request_payer.clone())
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|e| FetchError::Transport(format!("list {}: {}", prefix, e)))?;
            for obj in page.contents() {
                let Some(key) = obj.key() else { continue };
                let Some(modified) = obj.last_modified() else { continue };
                let last_modified =
                    DateTime::from_timestamp(modified.secs(), modified.subsec_nanos())
                        .unwrap_or_else(Utc::now);

                if let Some(after) = after {
                    if last_modified <= after {
                        continue;
                    }
                }
                if let Some(before) = before {
                    if last_modified > before {
                        continue;
                    }
                }

                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0),
                    last_modified,
                });
            }
        }

        log::info!("Found {} objects under {}", objects.len(), prefix);
        Ok(objects)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("Fetching object: {}", key);

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .set_request_payer(self.request_payer.clone())
            .send();

        let response = timeout(self.fetch_timeout, request)
            .await
            .map_err(|_| {
                FetchError::Transport(format!(
                    "fetch {} timed out after {}s",
                    key,
                    self.fetch_timeout.as_secs()
                ))
            })?
            .map_err(|e| FetchError::Transport(format!("fetch {}: {}", key, e)))?;

        let body = timeout(self.fetch_timeout, response.body.collect())
            .await
            .map_err(|_| {
                FetchError::Transport(format!(
                    "fetch {} body timed out after {}s",
                    key,
                    self.fetch_timeout.as_secs()
                ))
            })?
            .map_err(|e| FetchError::Transport(format!("fetch {} body: {}", key, e)))?;

        decompress_for_key(key, body.into_bytes().to_vec())
            .map_err(|message| FetchError::Decompression {
                key: key.to_string(),
                message,
            })
    }
}
