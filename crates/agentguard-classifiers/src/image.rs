//! Image integrity checks
//!
//! Images are read into memory once with [`read_image`]. The same buffer is
//! then verified and handed to the classifier, so a file replaced on disk
//! between the two steps cannot skip verification.

use agentguard_core::{Error, Result};
use std::io::Cursor;
use std::path::Path;

/// Default upper bound for image files
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Facts about an image that decoded cleanly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected container format
    pub format: Option<String>,
}

/// Decodes and verifies an in-memory image. Blocking.
pub trait ImageVerifier: Send + Sync {
    /// Return image facts, or an error if the buffer is too large, in an
    /// unknown format, or corrupt.
    fn verify(&self, image: &[u8]) -> Result<ImageInfo>;

    /// Largest image this verifier accepts, in bytes
    fn max_bytes(&self) -> u64 {
        DEFAULT_MAX_IMAGE_BYTES
    }
}

/// Read the image at `path`, refusing files larger than `max_bytes`.
///
/// The size is checked before reading and again on the buffer, since the
/// file may grow in between.
pub async fn read_image(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| Error::image(format!("cannot read {}: {}", path.display(), e)))?
        .len();
    check_size(size, max_bytes)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::image(format!("cannot read {}: {}", path.display(), e)))?;
    check_size(bytes.len() as u64, max_bytes)?;
    Ok(bytes)
}

fn check_size(size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(Error::image(format!(
            "image too large: {} bytes (max: {} bytes)",
            size, max_bytes
        )));
    }
    Ok(())
}

/// Verifier that fully decodes the image with the `image` crate
#[derive(Debug, Clone)]
pub struct DecodingVerifier {
    max_bytes: u64,
}

impl DecodingVerifier {
    /// Create a verifier with the default size limit
    pub fn new() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    /// Set the maximum accepted image size
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl Default for DecodingVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageVerifier for DecodingVerifier {
    fn verify(&self, image: &[u8]) -> Result<ImageInfo> {
        check_size(image.len() as u64, self.max_bytes)?;

        let reader = image::ImageReader::new(Cursor::new(image))
            .with_guessed_format()
            .map_err(|e| Error::image(format!("cannot open image: {}", e)))?;

        let format = reader
            .format()
            .map(|f| format!("{:?}", f).to_lowercase())
            .ok_or_else(|| Error::image("unrecognized image format"))?;

        let decoded = reader
            .decode()
            .map_err(|e| Error::image(format!("corrupt image: {}", e)))?;

        Ok(ImageInfo {
            width: decoded.width(),
            height: decoded.height(),
            format: Some(format),
        })
    }

    fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_valid_png() {
        let info = DecodingVerifier::new().verify(&png(4, 3)).unwrap();
        assert_eq!((info.width, info.height), (4, 3));
        assert_eq!(info.format.as_deref(), Some("png"));
    }

    #[test]
    fn test_not_an_image() {
        let err = DecodingVerifier::new()
            .verify(b"just some text, not pixels")
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn test_truncated_png() {
        let bytes = png(16, 16);
        assert!(DecodingVerifier::new().verify(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn test_size_limit() {
        let verifier = DecodingVerifier::new().with_max_bytes(4);
        assert_eq!(verifier.max_bytes(), 4);
        let err = verifier.verify(&png(8, 8)).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn test_read_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        std::fs::write(&path, png(2, 2)).unwrap();

        let bytes = read_image(&path, DEFAULT_MAX_IMAGE_BYTES).await.unwrap();
        assert_eq!(bytes, png(2, 2));

        let err = read_image(&path, 4).await.unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = read_image(Path::new("/nonexistent/agentguard.png"), DEFAULT_MAX_IMAGE_BYTES)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }
}
