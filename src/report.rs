//! Mapping report (image_map.csv)
//!
//! One row per input event recording what happened to its image.

use serde::Serialize;
use std::path::Path;

/// A single row of the mapping report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    pub index: usize,
    pub title: String,
    pub original_image: String,
    pub final_jpg_url: String,
    /// `no_image`, `ok`, or `error: <message>`
    pub status: String,
}

impl ReportRow {
    pub fn no_image(index: usize, title: &str) -> Self {
        Self {
            index,
            title: title.to_string(),
            original_image: String::new(),
            final_jpg_url: String::new(),
            status: "no_image".to_string(),
        }
    }

    pub fn ok(index: usize, title: &str, original: &str, url: &str) -> Self {
        Self {
            index,
            title: title.to_string(),
            original_image: original.to_string(),
            final_jpg_url: url.to_string(),
            status: "ok".to_string(),
        }
    }

    pub fn error(index: usize, title: &str, original: &str, message: &str) -> Self {
        Self {
            index,
            title: title.to_string(),
            original_image: original.to_string(),
            final_jpg_url: String::new(),
            status: format!("error: {}", message),
        }
    }
}

/// Write the report to `path` with a header row.
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_csv_has_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image_map.csv");

        let rows = vec![
            ReportRow::no_image(0, "No Pic"),
            ReportRow::ok(1, "Ok Pic", "https://x/a.png", "https://pages/img/a.jpg"),
            ReportRow::error(2, "Bad Pic", "https://x/b.png", "HTTP 404"),
        ];
        write_csv(&path, &rows).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "index,title,original_image,final_jpg_url,status"
        );
        assert_eq!(lines.clone().count(), 3);
        assert!(contents.contains("error: HTTP 404"));
    }
}
