//! Durable asset manifest
//!
//! The manifest is the sole authoritative ledger of which derived assets
//! exist and when each was last relevant. It is loaded best-effort at run
//! start, mutated in memory during sync and GC, and persisted exactly once
//! at run end.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::{BlobStore, StoreError};

/// Commit message used when persisting the manifest.
const SAVE_MESSAGE: &str = "Update manifest.json (auto)";

/// Errors from manifest persistence
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One derived asset's provenance and recency metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    /// Set once when the path first appears; never overwritten.
    pub first_added: DateTime<Utc>,
    /// Advanced every run the asset is (re)produced.
    pub last_seen: DateTime<Utc>,
    /// Most recent event title mapped to this path.
    pub title: String,
    /// Most recent source URL mapped to this path.
    pub source: String,
}

/// Mapping from repo-relative asset path to its record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub images: BTreeMap<String, AssetRecord>,
}

/// Whether `load` found a persisted manifest or substituted an empty one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestOrigin {
    /// Parsed from the store.
    Loaded,
    /// Absent or unreadable; history starts fresh this run.
    DefaultedEmpty,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the record for `path` after a successful upload.
    ///
    /// `first_added` is set only for new paths; `last_seen` always advances
    /// to `now`; title and source track the current event.
    pub fn record_seen(&mut self, path: &str, title: &str, source: &str, now: DateTime<Utc>) {
        match self.images.get_mut(path) {
            Some(record) => {
                record.last_seen = now;
                if !title.is_empty() {
                    record.title = title.to_string();
                }
                record.source = source.to_string();
            }
            None => {
                self.images.insert(
                    path.to_string(),
                    AssetRecord {
                        first_added: now,
                        last_seen: now,
                        title: title.to_string(),
                        source: source.to_string(),
                    },
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Loads and saves the manifest through a blob store.
pub struct ManifestStore<'a, S: BlobStore + ?Sized> {
    store: &'a S,
    path: String,
}

impl<'a, S: BlobStore + ?Sized> ManifestStore<'a, S> {
    pub fn new(store: &'a S, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    /// Best-effort fetch of the persisted manifest.
    ///
    /// Any fetch or parse failure yields an empty manifest with
    /// [`ManifestOrigin::DefaultedEmpty`] rather than aborting; the run
    /// proceeds even when manifest history is unavailable.
    pub fn load(&self) -> (Manifest, ManifestOrigin) {
        let blob = match self.store.get(&self.path) {
            Ok(Some(blob)) => blob,
            Ok(None) => return (Manifest::new(), ManifestOrigin::DefaultedEmpty),
            Err(e) => {
                eprintln!("[manifest] Fetch failed, starting empty: {}", e);
                return (Manifest::new(), ManifestOrigin::DefaultedEmpty);
            }
        };

        match serde_json::from_slice::<Manifest>(&blob.bytes) {
            Ok(manifest) => (manifest, ManifestOrigin::Loaded),
            Err(e) => {
                eprintln!("[manifest] Parse failed, starting empty: {}", e);
                (Manifest::new(), ManifestOrigin::DefaultedEmpty)
            }
        }
    }

    /// Serialize and persist the manifest.
    ///
    /// Called exactly once per run, after sync and GC have both mutated the
    /// in-memory manifest. This is the one commit that must succeed for the
    /// run's bookkeeping to be durable; failures surface to the caller.
    pub fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let bytes = serde_json::to_vec_pretty(manifest)?;
        let revision = self.store.get_revision(&self.path)?;
        self.store
            .put(&self.path, &bytes, SAVE_MESSAGE, revision.as_ref())?;
        Ok(())
    }
}

/// Current UTC time truncated to whole seconds, matching the persisted
/// timestamp precision.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
