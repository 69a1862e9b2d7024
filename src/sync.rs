//! Per-event sync pipeline
//!
//! For each event: fetch the source image, normalize it, derive its
//! content-addressed path, upload it, and record it in the manifest. Every
//! step returns an explicit result; a failure is annotated onto the event
//! and the batch moves on. One broken image never aborts the run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::fetch::ImageFetcher;
use crate::manifest::{now_utc, Manifest};
use crate::namer;
use crate::report::ReportRow;
use crate::store::BlobStore;
use crate::transcode::Transcoder;

/// An externally-supplied event record.
///
/// Unknown input fields are captured in `extra` and written back unchanged.
/// After sync, at most one of `image_jpg` / `image_jpg_error` is set;
/// events with no source image carry neither.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Source image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Public URL of the derived asset, set on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_jpg: Option<String>,

    /// Failure description, set when any per-event step fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_jpg_error: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Everything one sync pass produces.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Annotated events, same length and order as the input.
    pub events: Vec<EventRecord>,
    /// Paths touched this run; shields fresh assets from this run's GC pass.
    pub seen: HashSet<String>,
    /// One report row per input event.
    pub rows: Vec<ReportRow>,
}

impl SyncOutcome {
    /// Number of events annotated with an error.
    pub fn error_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.image_jpg_error.is_some())
            .count()
    }
}

/// Orchestrates fetch, transcode, naming, upload and manifest bookkeeping.
pub struct SyncEngine<'a, S, F, T>
where
    S: BlobStore + ?Sized,
    F: ImageFetcher,
    T: Transcoder,
{
    store: &'a S,
    fetcher: &'a F,
    transcoder: &'a T,
    pages_base: String,
}

impl<'a, S, F, T> SyncEngine<'a, S, F, T>
where
    S: BlobStore + ?Sized,
    F: ImageFetcher,
    T: Transcoder,
{
    pub fn new(store: &'a S, fetcher: &'a F, transcoder: &'a T, pages_base: String) -> Self {
        Self {
            store,
            fetcher,
            transcoder,
            pages_base: pages_base.trim_end_matches('/').to_string(),
        }
    }

    /// Process the whole batch in input order, mutating `manifest` for each
    /// successful upload.
    pub fn sync(&self, events: Vec<EventRecord>, manifest: &mut Manifest) -> SyncOutcome {
        let now = now_utc();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(events.len());
        let mut annotated = Vec::with_capacity(events.len());

        for (index, mut event) in events.into_iter().enumerate() {
            let title = event.title.clone().unwrap_or_default();
            let date = event.date.clone().unwrap_or_default();

            let Some(source) = event.image.clone() else {
                rows.push(ReportRow::no_image(index, &title));
                annotated.push(event);
                continue;
            };

            match self.produce_asset(&title, &source, &date) {
                Ok((path, url)) => {
                    event.image_jpg = Some(url.clone());
                    event.image_jpg_error = None;
                    manifest.record_seen(&path, &title, &source, now);
                    seen.insert(path);
                    rows.push(ReportRow::ok(index, &title, &source, &url));
                }
                Err(message) => {
                    eprintln!("[sync] event {} failed: {}", index, message);
                    event.image_jpg = None;
                    event.image_jpg_error = Some(message.clone());
                    rows.push(ReportRow::error(index, &title, &source, &message));
                }
            }
            annotated.push(event);
        }

        SyncOutcome {
            events: annotated,
            seen,
            rows,
        }
    }

    /// Fetch, transcode, name and upload one image.
    ///
    /// Returns the repo-relative path and public URL on success, or a
    /// human-readable failure description. The manifest is untouched on
    /// failure; no record exists for an upload that did not happen.
    fn produce_asset(
        &self,
        title: &str,
        source: &str,
        date: &str,
    ) -> Result<(String, String), String> {
        let raw = self.fetcher.fetch(source).map_err(|e| e.to_string())?;
        let jpg = self.transcoder.to_jpeg(&raw).map_err(|e| e.to_string())?;

        let path = namer::asset_path(title, source, date);
        let fname = path.rsplit('/').next().unwrap_or(&path);
        let message = format!("Add/Update {}", fname);

        // Overwrite-in-place when the object already exists.
        let revision = self
            .store
            .get_revision(&path)
            .map_err(|e| e.to_string())?;
        self.store
            .put(&path, &jpg, &message, revision.as_ref())
            .map_err(|e| e.to_string())?;

        let url = format!("{}/{}", self.pages_base, path);
        Ok((path, url))
    }
}
