//! Deterministic asset path derivation
//!
//! An asset's repo-relative path is a pure function of its event metadata:
//! `img/<year>/<month>/<slug>-<hash8>.jpg`. The filename depends only on the
//! title and the exact source URL, so re-ingesting the same image is an
//! idempotent overwrite rather than a duplicate blob. The folder depends only
//! on the event's date string; changing the date therefore relocates the
//! asset to a new folder and leaves the old copy for the garbage collector.

use md5::{Digest, Md5};

/// Maximum length of the slug component.
const SLUG_MAX: usize = 60;

/// Fixed month-abbreviation table for the `"Sat, 06 Sep 2025"` date format.
const MONTHS: &[(&str, &str)] = &[
    ("Jan", "01"),
    ("Feb", "02"),
    ("Mar", "03"),
    ("Apr", "04"),
    ("May", "05"),
    ("Jun", "06"),
    ("Jul", "07"),
    ("Aug", "08"),
    ("Sep", "09"),
    ("Oct", "10"),
    ("Nov", "11"),
    ("Dec", "12"),
];

/// Derive the repo-relative path for an event's derived asset.
pub fn asset_path(title: &str, source_url: &str, date: &str) -> String {
    format!(
        "img/{}/{}-{}.jpg",
        month_folder(date),
        slugify(title),
        hash8(source_url)
    )
}

/// Map a date string like `"Sat, 06 Sep 2025"` to `"2025/09"`.
///
/// Any parse failure (wrong token count, unknown month abbreviation,
/// non-numeric year) yields the literal folder `"undated"`; this never fails.
pub fn month_folder(date: &str) -> String {
    let parts: Vec<&str> = date.split_whitespace().collect();
    let [_, _, mon, year] = parts.as_slice() else {
        return "undated".to_string();
    };
    if year.is_empty() || !year.chars().all(|c| c.is_ascii_digit()) {
        return "undated".to_string();
    }
    match MONTHS.iter().find(|(abbrev, _)| abbrev == mon) {
        Some((_, num)) => format!("{}/{}", year, num),
        None => "undated".to_string(),
    }
}

/// Derive a URL-safe slug from a title, truncated to 60 characters.
///
/// Lowercase ASCII alphanumerics pass through; any run of other characters
/// collapses to a single `-`. An empty result substitutes `"img"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(SLUG_MAX));
    let mut pending_sep = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
        if slug.len() >= SLUG_MAX {
            break;
        }
    }

    slug.truncate(SLUG_MAX);
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "img".to_string()
    } else {
        slug
    }
}

/// First 8 hex characters of the MD5 digest of the exact source URL string.
pub fn hash8(source_url: &str) -> String {
    let digest = Md5::digest(source_url.as_bytes());
    hex::encode(digest)[..8].to_string()
}
