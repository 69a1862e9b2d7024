//! Retention GC scenarios spanning a full sync + prune + save run.

mod fixtures;

use std::collections::HashSet;

use bulletin_sync::manifest::{now_utc, ManifestOrigin};
use bulletin_sync::{
    gc, GcPolicy, ImageTranscoder, Manifest, ManifestStore, MemoryStore, SyncEngine,
};
use chrono::Duration;
use fixtures::{event, png_bytes, MapFetcher};

const PAGES: &str = "https://logunlacc.github.io/lacc-bulletin-assets";

/// Age a manifest entry as if its last sync happened `days` ago.
fn backdate(manifest: &mut Manifest, path: &str, days: i64) {
    let record = manifest.images.get_mut(path).unwrap();
    record.first_added = record.first_added - Duration::days(days);
    record.last_seen = record.last_seen - Duration::days(days);
}

#[test]
fn asset_absent_from_a_later_run_is_pruned_after_retention() {
    let store = MemoryStore::new();
    let fetcher = MapFetcher::new(&[("https://x/a.png", png_bytes(50, 50))]);
    let transcoder = ImageTranscoder::default();
    let engine = SyncEngine::new(&store, &fetcher, &transcoder, PAGES.to_string());

    // Run 1 uploads the asset.
    let mut manifest = Manifest::new();
    let outcome = engine.sync(
        vec![event("Farmers Market", "Sat, 06 Sep 2025", Some("https://x/a.png"))],
        &mut manifest,
    );
    let path = outcome.seen.iter().next().unwrap().clone();

    // 61 days pass; the event is absent from the new input batch.
    backdate(&mut manifest, &path, 61);
    let later_outcome = engine.sync(vec![], &mut manifest);

    let result = gc::prune(
        &mut manifest,
        &later_outcome.seen,
        &store,
        &["img/static/".to_string()],
        &GcPolicy::new(60),
    );

    assert_eq!(result.candidates, vec![path.clone()]);
    assert_eq!(result.deleted, vec![path.clone()]);
    assert!(!store.contains(&path));
    assert!(manifest.is_empty());
}

#[test]
fn seen_this_run_shields_a_stale_entry() {
    let store = MemoryStore::new();
    let fetcher = MapFetcher::new(&[("https://x/a.png", png_bytes(50, 50))]);
    let transcoder = ImageTranscoder::default();
    let engine = SyncEngine::new(&store, &fetcher, &transcoder, PAGES.to_string());

    let mut manifest = Manifest::new();
    let outcome = engine.sync(
        vec![event("Farmers Market", "Sat, 06 Sep 2025", Some("https://x/a.png"))],
        &mut manifest,
    );
    let path = outcome.seen.iter().next().unwrap().clone();

    // Entry looks ancient on paper, but this run just (re)produced it.
    backdate(&mut manifest, &path, 365);

    let result = gc::prune(
        &mut manifest,
        &outcome.seen,
        &store,
        &[],
        &GcPolicy::new(60),
    );

    assert!(result.candidates.is_empty());
    assert!(store.contains(&path));
    assert_eq!(manifest.len(), 1);
}

#[test]
fn protected_prefix_survives_any_age() {
    let store = MemoryStore::new();
    store.seed("img/static/logo-00000000.jpg", vec![1]);

    let mut manifest = Manifest::new();
    manifest.record_seen(
        "img/static/logo-00000000.jpg",
        "Logo",
        "https://x/logo.png",
        now_utc() - Duration::days(1000),
    );

    let result = gc::prune(
        &mut manifest,
        &HashSet::new(),
        &store,
        &["img/static/".to_string()],
        &GcPolicy::new(60),
    );

    assert!(result.candidates.is_empty());
    assert!(store.contains("img/static/logo-00000000.jpg"));
}

#[test]
fn dry_run_previews_but_last_seen_updates_still_persist() {
    let store = MemoryStore::new();
    let fetcher = MapFetcher::new(&[("https://x/fresh.png", png_bytes(50, 50))]);
    let transcoder = ImageTranscoder::default();
    let engine = SyncEngine::new(&store, &fetcher, &transcoder, PAGES.to_string());

    // A stale asset from history plus a fresh one from this run.
    store.seed("img/2025/01/old-11111111.jpg", vec![1]);
    let mut manifest = Manifest::new();
    manifest.record_seen(
        "img/2025/01/old-11111111.jpg",
        "Old",
        "https://x/old.png",
        now_utc() - Duration::days(120),
    );

    let outcome = engine.sync(
        vec![event("Fresh", "Sat, 06 Sep 2025", Some("https://x/fresh.png"))],
        &mut manifest,
    );

    let result = gc::prune(
        &mut manifest,
        &outcome.seen,
        &store,
        &[],
        &GcPolicy::new(60).with_dry_run(),
    );

    // Preview names the stale path but deletes nothing anywhere.
    assert_eq!(result.candidates, vec!["img/2025/01/old-11111111.jpg"]);
    assert!(result.deleted.is_empty());
    assert!(store.contains("img/2025/01/old-11111111.jpg"));
    assert_eq!(manifest.len(), 2);

    // The per-run manifest save still commits the fresh last_seen.
    let manifest_store = ManifestStore::new(&store, "manifest.json");
    manifest_store.save(&manifest).unwrap();

    let (loaded, origin) = manifest_store.load();
    assert_eq!(origin, ManifestOrigin::Loaded);
    assert_eq!(loaded.len(), 2);
    assert!(loaded.images.contains_key("img/2025/01/old-11111111.jpg"));
}

#[test]
fn live_and_dry_runs_agree_on_candidates() {
    let store = MemoryStore::new();
    store.seed("img/2025/01/old-22222222.jpg", vec![1]);
    let mut manifest = Manifest::new();
    manifest.record_seen(
        "img/2025/01/old-22222222.jpg",
        "Old",
        "https://x/old.png",
        now_utc() - Duration::days(120),
    );

    let preview = gc::prune(
        &mut manifest,
        &HashSet::new(),
        &store,
        &[],
        &GcPolicy::new(60).with_dry_run(),
    );
    let live = gc::prune(
        &mut manifest,
        &HashSet::new(),
        &store,
        &[],
        &GcPolicy::new(60),
    );

    assert_eq!(preview.candidates, live.candidates);
    assert_eq!(live.deleted, live.candidates);
}
