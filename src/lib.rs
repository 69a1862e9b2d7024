//! bulletin-sync - Event image sync and retention GC
//!
//! This crate ingests a JSON list of event records carrying remote image
//! URLs, normalizes each image to JPEG, uploads it to a GitHub Pages asset
//! repository under a deterministic content-addressed path, and maintains a
//! durable manifest of live assets. A retention-based garbage collector
//! prunes assets no longer referenced by any recent run.

pub mod config;
pub mod fetch;
pub mod gc;
pub mod manifest;
pub mod namer;
pub mod report;
pub mod store;
pub mod sync;
pub mod transcode;

pub use config::{ConfigError, SyncConfig};
pub use fetch::{FetchError, HttpFetcher, ImageFetcher};
pub use gc::{GcPolicy, GcResult};
pub use manifest::{AssetRecord, Manifest, ManifestOrigin, ManifestStore};
pub use store::{BlobStore, GitHubStore, MemoryStore, Revision, StoreError};
pub use sync::{EventRecord, SyncEngine, SyncOutcome};
pub use transcode::{ImageTranscoder, TranscodeError, Transcoder};
