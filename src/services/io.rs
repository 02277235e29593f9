//! Image I/O operations service
//!
//! Preview encoding, download saving and image inspection, kept apart from
//! the session logic so the controller only sequences them.

use crate::{
    encoding::EncodedImage,
    error::{RemovalError, Result},
    intake::UploadedFile,
};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// File name every download is saved under
pub const DOWNLOAD_FILE_NAME: &str = "removed-background.png";

/// What the compare view shows about one side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSummary {
    /// MIME type from the data URL header
    pub mime: String,
    /// Decoded size in bytes
    pub byte_len: usize,
    /// Pixel dimensions, when the header could be read
    pub dimensions: Option<(u32, u32)>,
}

/// Service for handling image data input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Encode an admitted file into a preview data URL
    ///
    /// Base64 over up to 25 MiB is done on the blocking pool.
    pub async fn encode_preview(file: &UploadedFile) -> Result<EncodedImage> {
        let bytes = file.shared_bytes();
        let mime = file.mime().to_string();
        tokio::task::spawn_blocking(move || EncodedImage::from_bytes(&mime, &bytes))
            .await
            .map_err(|e| RemovalError::internal(format!("preview encoding task failed: {}", e)))
    }

    /// Write the decoded image to `<dir>/removed-background.png`
    ///
    /// # Returns
    /// The path written to
    pub async fn save_download(image: &EncodedImage, dir: &Path) -> Result<PathBuf> {
        let bytes = image.decode()?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| RemovalError::file_io_error("create output directory", dir, &e))?;

        let path = dir.join(DOWNLOAD_FILE_NAME);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| RemovalError::file_io_error("write download", &path, &e))?;

        log::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Summarise an encoded image for display
    ///
    /// Only the image header is parsed; undecodable payloads yield no dimensions.
    #[must_use]
    pub fn summarize(image: &EncodedImage) -> ImageSummary {
        let bytes = image.decode().unwrap_or_default();
        let dimensions = image::ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());

        ImageSummary {
            mime: image.mime().to_string(),
            byte_len: bytes.len(),
            dimensions,
        }
    }
}
