//! Shared test fixtures for the integration suites.

use std::collections::HashMap;
use std::io::Cursor;

use bulletin_sync::fetch::{FetchError, ImageFetcher};
use bulletin_sync::EventRecord;
use image::{ImageFormat, RgbaImage};

/// Serves canned bytes per URL; unknown URLs fail like a dead host.
pub struct MapFetcher(HashMap<String, Vec<u8>>);

impl MapFetcher {
    pub fn new(urls: &[(&str, Vec<u8>)]) -> Self {
        Self(
            urls.iter()
                .map(|(u, b)| (u.to_string(), b.clone()))
                .collect(),
        )
    }
}

impl ImageFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.0.get(url).cloned().ok_or_else(|| FetchError::Other {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

/// A small gradient PNG, decodable by the real transcoder.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn event(title: &str, date: &str, image: Option<&str>) -> EventRecord {
    EventRecord {
        title: Some(title.to_string()),
        date: Some(date.to_string()),
        image: image.map(str::to_string),
        ..EventRecord::default()
    }
}
