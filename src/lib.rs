#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Remote Background Removal
//!
//! Background removal through the remove.bg HTTP API (or a proxy that holds
//! the credential), plus the session logic of a small upload → compare →
//! download front end.
//!
//! ## Features
//!
//! - **Remote Client**: multipart upload, status-to-message mapping, PNG result as a data URL
//! - **Session Controller**: single-session state published over a `watch` channel,
//!   with late results from superseded attempts discarded
//! - **Intake Filter**: PNG/JPG/JPEG only, one file at a time, 25 MB limit
//! - **Liveness Ticker**: an indeterminate progress value while a request is in flight
//! - **Layered Configuration**: defaults, JSON file, environment, then explicit overrides
//! - **CLI Integration**: one-shot mode and an interactive shell (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove_remote::{remove_background_from_path, RemovalConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RemovalConfig::builder()
//!     .api_key(std::env::var("REMOVE_BG_API_KEY")?)
//!     .build()?;
//!
//! let result = remove_background_from_path("photo.jpg", &config).await?;
//! std::fs::write("removed-background.png", result.decode()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving a session
//!
//! ```rust,no_run
//! use bgremove_remote::{RemoveBgClient, RemovalConfig, SessionController, UploadedFile};
//! use std::sync::Arc;
//!
//! # async fn example(bytes: Vec<u8>) -> anyhow::Result<()> {
//! let config = RemovalConfig::load(None)?.with_env();
//! let client = RemoveBgClient::new(&config)?;
//! let controller = SessionController::from_config(&config, Arc::new(client));
//!
//! let mut updates = controller.subscribe();
//! tokio::spawn(async move {
//!     while updates.changed().await.is_ok() {
//!         println!("{}%", updates.borrow_and_update().state().upload_progress);
//!     }
//! });
//!
//! controller.on_drop(UploadedFile::sniffed("photo.png", bytes)).await;
//! controller.handle_download(std::path::Path::new(".")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, progress bar and tracing subscriber setup
//! - `tracing-json`: JSON log output for the CLI
//!
//! To use only as a library without CLI dependencies:
//!
//! ```toml
//! [dependencies]
//! bgremove-remote = { version = "0.1", default-features = false }
//! ```

pub mod client;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod controller;
pub mod encoding;
pub mod error;
pub mod intake;
pub mod render;
pub mod services;
pub mod session;
#[cfg(feature = "cli")]
pub mod tracing_config;

use std::path::Path;

// Public API exports
pub use client::{classify_failure, BackgroundRemover, MockRemover, MockResponse, RemoveBgClient};
pub use config::{ProgressConfig, RemovalConfig, RemovalConfigBuilder};
pub use controller::SessionController;
pub use encoding::EncodedImage;
pub use error::{RemovalError, Result};
pub use intake::{IntakeError, IntakeFilter, UploadedFile};
pub use render::{format_size, render, Palette, View};
pub use services::{ImageIOService, LivenessTicker, ProcessingStage, DOWNLOAD_FILE_NAME};
pub use session::{AttemptId, Session, SessionState, Theme};

#[cfg(feature = "cli")]
pub use tracing_config::{TracingConfig, TracingFormat};

/// Remove the background of an in-memory image
///
/// The declared MIME type is sniffed from the content, so bytes that are not
/// an image fail with [`RemovalError::InvalidInput`] before any request.
///
/// # Examples
///
/// ```rust,no_run
/// use bgremove_remote::{remove_background_from_bytes, RemovalConfig};
///
/// # async fn example(upload: Vec<u8>) -> anyhow::Result<()> {
/// let config = RemovalConfig::builder()
///     .endpoint("http://127.0.0.1:8080/remove-bg")
///     .build()?;
/// let result = remove_background_from_bytes("upload.png", upload, &config).await?;
/// assert_eq!(result.mime(), "image/png");
/// # Ok(())
/// # }
/// ```
pub async fn remove_background_from_bytes<N: Into<String>>(
    name: N,
    bytes: Vec<u8>,
    config: &RemovalConfig,
) -> Result<EncodedImage> {
    let file =
        IntakeFilter::new(config.max_upload_bytes).admit_file(UploadedFile::sniffed(name, bytes))?;
    RemoveBgClient::new(config)?.remove_background(&file).await
}

/// Remove the background of an image file on disk
///
/// The file goes through the same intake filter as a dropped file.
pub async fn remove_background_from_path<P: AsRef<Path>>(
    path: P,
    config: &RemovalConfig,
) -> Result<EncodedImage> {
    let file = IntakeFilter::new(config.max_upload_bytes)
        .admit_path(path)
        .await?;
    RemoveBgClient::new(config)?.remove_background(&file).await
}
