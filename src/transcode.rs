//! Image normalization
//!
//! Turns arbitrarily-formatted source images (JPEG, PNG, GIF, WebP, ...)
//! into email-friendly JPEG bytes: resized down to a maximum width with
//! Lanczos resampling, converted to a grayscale or RGB color model, and
//! re-encoded at a fixed quality. Every failure is a typed error the sync
//! engine catches per event; a bad image never takes down the batch.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError};

/// Errors from image decode/encode
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
}

/// Raw bytes in, normalized JPEG bytes out.
pub trait Transcoder {
    fn to_jpeg(&self, data: &[u8]) -> Result<Vec<u8>, TranscodeError>;
}

/// Production transcoder backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageTranscoder {
    /// Resize images wider than this down to it (0 = no resize)
    pub max_width: u32,
    /// JPEG encode quality (1-100)
    pub quality: u8,
}

impl ImageTranscoder {
    pub fn new(max_width: u32, quality: u8) -> Self {
        Self { max_width, quality }
    }
}

impl Default for ImageTranscoder {
    fn default() -> Self {
        Self::new(1200, 88)
    }
}

impl Transcoder for ImageTranscoder {
    fn to_jpeg(&self, data: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        let mut img = image::load_from_memory(data)?;

        if self.max_width > 0 && img.width() > self.max_width {
            let height =
                (self.max_width as u64 * img.height() as u64 / img.width() as u64) as u32;
            img = img.resize_exact(self.max_width, height.max(1), FilterType::Lanczos3);
        }

        // JPEG supports only L8 and RGB8 pixel layouts.
        let img = match img {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };

        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
        img.write_with_encoder(encoder)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_small_image_is_not_resized() {
        let transcoder = ImageTranscoder::new(1200, 88);
        let jpg = transcoder.to_jpeg(&png_fixture(100, 80)).unwrap();

        let decoded = image::load_from_memory(&jpg).unwrap();
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 80);
        // JPEG magic bytes
        assert_eq!(&jpg[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_wide_image_is_resized_preserving_aspect() {
        let transcoder = ImageTranscoder::new(200, 88);
        let jpg = transcoder.to_jpeg(&png_fixture(400, 100)).unwrap();

        let decoded = image::load_from_memory(&jpg).unwrap();
        assert_eq!(decoded.width(), 200);
        assert_eq!(decoded.height(), 50);
    }

    #[test]
    fn test_zero_max_width_disables_resize() {
        let transcoder = ImageTranscoder::new(0, 88);
        let jpg = transcoder.to_jpeg(&png_fixture(400, 100)).unwrap();

        let decoded = image::load_from_memory(&jpg).unwrap();
        assert_eq!(decoded.width(), 400);
    }

    #[test]
    fn test_garbage_bytes_error_instead_of_panic() {
        let transcoder = ImageTranscoder::default();
        assert!(transcoder.to_jpeg(b"not an image").is_err());
    }

    #[test]
    fn test_rgba_input_converts_to_rgb() {
        // RGBA is not a valid JPEG layout; the transcoder must convert.
        let transcoder = ImageTranscoder::default();
        let jpg = transcoder.to_jpeg(&png_fixture(10, 10)).unwrap();
        let decoded = image::load_from_memory(&jpg).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }
}
