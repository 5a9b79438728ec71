//! Object-store access for Hyperliquid node fill data.
//!
//! The node operator publishes newline-delimited JSON fill batches to an S3
//! bucket under `node_fills_by_block/[block_number]/`, compressed per object
//! (gzip or LZ4 frame, chosen by key suffix). This module lists and fetches
//! those objects; it carries no business logic.
//!
//! Access is anonymous + requester-pays by default, matching how the public
//! node-data buckets are exposed; static credentials can be configured for
//! private mirrors.

pub mod codec;
pub mod object_store;

pub use object_store::{FetchError, ObjectInfo, ObjectStoreClient, S3ObjectStore};
