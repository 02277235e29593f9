//! File intake
//!
//! The gate every candidate file passes before it reaches the controller.
//! Rejected files never touch session state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Maximum accepted upload size (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Extensions the intake filter accepts, compared case-insensitively
pub const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// MIME type declared for content that is not a recognised image
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Why a candidate file was refused at intake
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("'{name}' is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("'{name}' is not a supported image (accepted: PNG, JPG, JPEG)")]
    UnsupportedType { name: String },

    #[error("only one file can be processed at a time ({count} given)")]
    TooManyFiles { count: usize },

    #[error("no file given")]
    NoFile,

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An admitted file: name, declared MIME type and content
#[derive(Debug, Clone)]
pub struct UploadedFile {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
}

impl UploadedFile {
    /// Build a file with an explicitly declared MIME type
    pub fn new<N: Into<String>, M: Into<String>>(name: N, mime: M, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Build a file whose MIME type is sniffed from its content
    pub fn sniffed<N: Into<String>>(name: N, bytes: Vec<u8>) -> Self {
        let mime = sniff_mime(&bytes);
        Self::new(name, mime, bytes)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the content, cheap to move into blocking tasks
    #[must_use]
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the declared type is an image type
    #[must_use]
    pub fn declares_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Declared MIME type derived from the leading bytes
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes).map_or(UNKNOWN_MIME, |format| format.to_mime_type())
}

/// Type and size filter applied before a file reaches the controller
#[derive(Debug, Clone)]
pub struct IntakeFilter {
    max_bytes: u64,
}

impl Default for IntakeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl IntakeFilter {
    #[must_use]
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check name and size without looking at content
    pub fn check(&self, name: &str, size: u64) -> Result<(), IntakeError> {
        if !has_accepted_extension(name) {
            return Err(IntakeError::UnsupportedType {
                name: name.to_string(),
            });
        }
        if size > self.max_bytes {
            return Err(IntakeError::TooLarge {
                name: name.to_string(),
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Admit an in-memory file
    pub fn admit_file(&self, file: UploadedFile) -> Result<UploadedFile, IntakeError> {
        self.check(file.name(), file.size())?;
        Ok(file)
    }

    /// Admit exactly one path from a dropped selection
    pub async fn admit<P: AsRef<Path>>(&self, paths: &[P]) -> Result<UploadedFile, IntakeError> {
        match paths {
            [] => Err(IntakeError::NoFile),
            [path] => self.admit_path(path).await,
            _ => Err(IntakeError::TooManyFiles { count: paths.len() }),
        }
    }

    /// Stat, filter and read a file from disk
    ///
    /// The size limit is applied to the metadata before any content is read.
    pub async fn admit_path<P: AsRef<Path>>(&self, path: P) -> Result<UploadedFile, IntakeError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let io_err = |source| IntakeError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        self.check(&name, metadata.len())?;

        let bytes = tokio::fs::read(path).await.map_err(io_err)?;
        // The file may have grown between stat and read
        self.check(&name, bytes.len() as u64)?;

        let file = UploadedFile::sniffed(name, bytes);
        log::debug!(
            "Admitted '{}' ({} bytes, declared {})",
            file.name(),
            file.size(),
            file.mime()
        );
        Ok(file)
    }
}

fn has_accepted_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
}
