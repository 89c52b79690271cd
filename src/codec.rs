//! JPEG to AVIF transcoding
//!
//! All pixel-level work is delegated to the `image` crate (ravif-backed AVIF
//! encoder). Encoding is CPU-bound and can take hundreds of milliseconds for
//! a large photo, so it runs on the blocking thread pool.

use crate::config::EncodingConfig;
use crate::error::CodecError;
use image::ImageEncoder;

/// JPEG decoder + AVIF encoder with fixed quality settings
#[derive(Clone, Copy, Debug)]
pub struct AvifCodec {
    quality: u8,
    speed: u8,
}

impl AvifCodec {
    /// Create a codec from encoder settings
    pub fn new(encoding: &EncodingConfig) -> Self {
        Self {
            quality: encoding.quality,
            speed: encoding.speed,
        }
    }

    /// Transcode JPEG bytes to AVIF bytes
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the input is not a decodable JPEG,
    /// or [`CodecError::Encode`] if AVIF encoding fails.
    pub async fn encode(&self, jpeg: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let quality = self.quality;
        let speed = self.speed;

        tokio::task::spawn_blocking(move || transcode(&jpeg, quality, speed))
            .await
            .map_err(|e| CodecError::Encode(format!("encoder task failed: {}", e)))?
    }
}

fn transcode(jpeg: &[u8], quality: u8, speed: u8) -> Result<Vec<u8>, CodecError> {
    let decoded = image::load_from_memory_with_format(jpeg, image::ImageFormat::Jpeg)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut out = Vec::new();
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(&mut out, speed, quality);
    encoder
        .write_image(rgba.as_raw(), width, height, image::ColorType::Rgba8)
        .map_err(|e| CodecError::Encode(e.to_string()))?;

    Ok(out)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// A small valid JPEG generated in memory
    fn tiny_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_fn(16, 16, |x, y| {
            image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
        });
        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 85);
        encoder
            .encode(img.as_raw(), 16, 16, image::ColorType::Rgb8)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn encodes_jpeg_to_avif() {
        let codec = AvifCodec::new(&EncodingConfig::default());

        let avif = codec.encode(tiny_jpeg()).await.unwrap();

        assert!(!avif.is_empty(), "encoded output should not be empty");
        // AVIF files start with an ISO-BMFF ftyp box
        assert_eq!(&avif[4..8], b"ftyp", "output should be an ISO-BMFF file");
    }

    #[tokio::test]
    async fn rejects_non_jpeg_input() {
        let codec = AvifCodec::new(&EncodingConfig::default());

        let result = codec.encode(vec![0u8; 128]).await;

        match result {
            Err(CodecError::Decode(_)) => {}
            other => panic!("expected decode error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_truncated_jpeg() {
        let codec = AvifCodec::new(&EncodingConfig::default());
        let mut jpeg = tiny_jpeg();
        jpeg.truncate(jpeg.len() / 4);

        let result = codec.encode(jpeg).await;
        assert!(result.is_err(), "truncated JPEG should fail to transcode");
    }
}
