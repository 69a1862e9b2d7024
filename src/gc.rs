//! Retention-based garbage collection
//!
//! A manifest entry is a deletion candidate only when all three hold: its
//! path matches no protected prefix, it was not touched by the current run,
//! and its `last_seen` is strictly older than the retention cutoff. One
//! linear pass, no retries; a failed delete is reported and the pass moves
//! on to the next candidate.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::manifest::{now_utc, Manifest};
use crate::store::{BlobStore, DeleteOutcome};

/// Retention policy for derived assets.
#[derive(Debug, Clone)]
pub struct GcPolicy {
    /// Entries unseen for longer than this many days become candidates.
    pub retention_days: i64,
    /// Preview mode: report candidates, mutate nothing.
    pub dry_run: bool,
}

impl GcPolicy {
    pub fn new(retention_days: i64) -> Self {
        Self {
            retention_days,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Entries with `last_seen` strictly before this instant are stale.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.retention_days)
    }
}

/// Result of a GC pass.
#[derive(Debug, Clone, Default)]
pub struct GcResult {
    /// Paths that met the deletion criteria, in manifest order.
    pub candidates: Vec<String>,
    /// Paths actually removed (empty on a dry run).
    pub deleted: Vec<String>,
    /// Per-candidate failures (non-fatal).
    pub errors: Vec<String>,
}

/// Is `path` shielded by a protected prefix?
fn is_protected(path: &str, protected_prefixes: &[String]) -> bool {
    protected_prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

/// Delete stale, unprotected, unseen manifest entries from the store.
///
/// In live mode each deleted entry is also removed from the in-memory
/// manifest; an object the store reports as already absent counts as
/// removed (reconciles manifest drift). Dry-run performs no mutation at
/// all but returns the same candidate list a live run would act on.
pub fn prune<S: BlobStore + ?Sized>(
    manifest: &mut Manifest,
    seen: &HashSet<String>,
    store: &S,
    protected_prefixes: &[String],
    policy: &GcPolicy,
) -> GcResult {
    let cutoff = policy.cutoff(now_utc());
    let mut result = GcResult::default();

    result.candidates = manifest
        .images
        .iter()
        .filter(|(path, record)| {
            !is_protected(path, protected_prefixes)
                && !seen.contains(path.as_str())
                && record.last_seen < cutoff
        })
        .map(|(path, _)| path.clone())
        .collect();

    if policy.dry_run {
        for path in &result.candidates {
            eprintln!("[gc] DRY-RUN: would delete {}", path);
        }
        return result;
    }

    let message_for = |path: &str| {
        format!(
            "Prune unused asset (> {}d): {}",
            policy.retention_days, path
        )
    };

    for path in &result.candidates {
        let revision = match store.get_revision(path) {
            Ok(rev) => rev,
            Err(e) => {
                result.errors.push(format!("{}: {}", path, e));
                continue;
            }
        };

        match revision {
            // Already gone from the store; drop the stale ledger entry.
            None => {
                manifest.images.remove(path);
                result.deleted.push(path.clone());
            }
            Some(rev) => match store.delete(path, &rev, &message_for(path)) {
                Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::AlreadyAbsent) => {
                    manifest.images.remove(path);
                    result.deleted.push(path.clone());
                    eprintln!("[gc] Deleted {}", path);
                }
                Err(e) => {
                    result.errors.push(format!("{}: {}", path, e));
                }
            },
        }
    }

    result
}
