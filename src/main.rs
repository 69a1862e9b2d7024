//! bulletin-sync CLI
//!
//! Entry point for the `bulletin-sync` command-line tool. Per-item failures
//! are reflected in the output annotations and the mapping report; a
//! non-zero exit is reserved for configuration errors (2) and a failed
//! manifest save (1).

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use bulletin_sync::manifest::ManifestOrigin;
use bulletin_sync::{
    gc, report, EventRecord, GcPolicy, GitHubStore, HttpFetcher, ImageTranscoder, ManifestStore,
    SyncConfig, SyncEngine,
};

#[derive(Parser)]
#[command(name = "bulletin-sync")]
#[command(about = "Upload event images to a GitHub Pages repo, update JSON, and prune old assets", version)]
struct Cli {
    /// Path to the input events JSON
    #[arg(long, default_value = "events.json")]
    input: PathBuf,

    /// Path to write the annotated events JSON
    #[arg(long, default_value = "updated_events.json")]
    output: PathBuf,

    /// Path to write the mapping report CSV
    #[arg(long, default_value = "image_map.csv")]
    mapcsv: PathBuf,

    /// Prune assets unseen for longer than the retention window
    #[arg(long)]
    prune: bool,

    /// Retention days before deletion
    #[arg(long, default_value_t = 60)]
    retention: i64,

    /// Preview deletions without deleting (manifest last_seen updates still persist)
    #[arg(long)]
    dry_run: bool,

    /// Path to a bulletin-sync.toml config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // Configuration failures abort before any work is attempted.
    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(2);
        }
    };
    let token = match SyncConfig::token_from_env() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(2);
        }
    };

    let events: Vec<EventRecord> = match fs::read_to_string(&cli.input)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(events) => events,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.input.display(), e);
            process::exit(2);
        }
    };

    let store = match GitHubStore::new(
        &config.owner,
        &config.repo,
        &config.branch,
        token,
        Duration::from_secs(config.fetch_timeout_secs),
        Duration::from_secs(config.store_timeout_secs),
    ) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to build store client: {}", e);
            process::exit(2);
        }
    };
    let fetcher = match HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs)) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("Failed to build fetch client: {}", e);
            process::exit(2);
        }
    };
    let transcoder = ImageTranscoder::new(config.max_width, config.jpeg_quality);

    // Best-effort manifest load; an unavailable manifest costs history, not the run.
    let manifest_store = ManifestStore::new(&store, config.manifest_path.clone());
    let (mut manifest, origin) = manifest_store.load();
    if origin == ManifestOrigin::DefaultedEmpty {
        eprintln!("[manifest] No usable manifest found; starting empty");
    }

    let engine = SyncEngine::new(&store, &fetcher, &transcoder, config.pages_base());
    let outcome = engine.sync(events, &mut manifest);

    if let Err(e) = write_outputs(&cli, &outcome) {
        eprintln!("Failed to write outputs: {}", e);
        // Uploads already landed remotely; keep their bookkeeping durable
        // even though local outputs could not be written.
        if let Err(e) = manifest_store.save(&manifest) {
            eprintln!("[manifest] Save failed: {}", e);
        }
        process::exit(1);
    }

    let mut deleted = 0;
    if cli.prune {
        let mut policy = GcPolicy::new(cli.retention);
        if cli.dry_run {
            policy = policy.with_dry_run();
        }
        let result = gc::prune(
            &mut manifest,
            &outcome.seen,
            &store,
            &config.protected_prefixes,
            &policy,
        );
        for error in &result.errors {
            eprintln!("[gc] Delete failed: {}", error);
        }
        deleted = if cli.dry_run {
            result.candidates.len()
        } else {
            result.deleted.len()
        };
        println!(
            "{}Prune candidates deleted: {}",
            if cli.dry_run { "(DRY-RUN) " } else { "" },
            deleted
        );
    }

    // The one commit that must succeed for the run's bookkeeping to be
    // durable. last_seen updates persist even on a dry-run GC pass.
    if let Err(e) = manifest_store.save(&manifest) {
        eprintln!("[manifest] Save failed: {}", e);
        process::exit(1);
    }

    println!(
        "Finished. Wrote {} and {}. {} file(s) {}deleted. {} event error(s).",
        cli.output.display(),
        cli.mapcsv.display(),
        deleted,
        if cli.dry_run { "would be " } else { "" },
        outcome.error_count()
    );
}

/// Load config from the given path, the default location, or built-in defaults.
fn load_config(path: Option<&std::path::Path>) -> Result<SyncConfig, String> {
    match path {
        Some(path) => SyncConfig::from_file(path).map_err(|e| e.to_string()),
        None => {
            let default_path = PathBuf::from("bulletin-sync.toml");
            if default_path.exists() {
                SyncConfig::from_file(&default_path).map_err(|e| e.to_string())
            } else {
                Ok(SyncConfig::default())
            }
        }
    }
}

/// Write the annotated event list and the mapping report.
fn write_outputs(cli: &Cli, outcome: &bulletin_sync::SyncOutcome) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&outcome.events).map_err(|e| e.to_string())?;
    fs::write(&cli.output, json).map_err(|e| e.to_string())?;
    report::write_csv(&cli.mapcsv, &outcome.rows).map_err(|e| e.to_string())?;
    Ok(())
}
