//! Session controller
//!
//! Owns the session state and sequences one upload attempt. Preview
//! encoding and the remote call (with its liveness ticker) run concurrently;
//! the attempt settles only once both are done. Every state change goes
//! through `send_if_modified` on the watch channel the render layer
//! subscribes to.

use crate::client::BackgroundRemover;
use crate::config::{ProgressConfig, RemovalConfig};
use crate::encoding::EncodedImage;
use crate::error::Result;
use crate::intake::UploadedFile;
use crate::services::{ImageIOService, LivenessTicker};
use crate::session::{AttemptId, Session, SessionState, Theme};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

/// Drives the upload → remove → compare/download workflow
#[derive(Clone)]
pub struct SessionController {
    session: Arc<watch::Sender<Session>>,
    remover: Arc<dyn BackgroundRemover>,
    progress: ProgressConfig,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("remover", &self.remover.name())
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    #[must_use]
    pub fn new(remover: Arc<dyn BackgroundRemover>, theme: Theme, progress: ProgressConfig) -> Self {
        let (session, _) = watch::channel(Session::new(theme));
        Self {
            session: Arc::new(session),
            remover,
            progress,
        }
    }

    /// Controller using the theme and ticker settings of `config`
    #[must_use]
    pub fn from_config(config: &RemovalConfig, remover: Arc<dyn BackgroundRemover>) -> Self {
        Self::new(remover, config.theme, config.progress)
    }

    /// Receiver notified on every visible change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Copy of the current visible state
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.session.borrow().state().clone()
    }

    #[must_use]
    pub fn active_attempt(&self) -> Option<AttemptId> {
        self.session.borrow().active_attempt()
    }

    /// Flip light/dark and return the new theme
    pub fn toggle_theme(&self) -> Theme {
        self.session.send_modify(|s| {
            s.toggle_theme();
        });
        let theme = self.session.borrow().state().theme;
        debug!(%theme, "theme toggled");
        theme
    }

    /// "Upload New Image": clear everything but the theme
    pub fn reset(&self) {
        if self.session.send_if_modified(Session::reset) {
            info!("session reset");
        }
    }

    /// Run one attempt for an admitted file
    ///
    /// The previous outcome is cleared before anything asynchronous starts.
    /// `is_processing` stays set until both the preview and the remote call
    /// have finished, so a result never shows without its original. If a
    /// newer attempt or a reset happened meanwhile, this attempt's results
    /// are dropped.
    pub async fn on_drop(&self, file: UploadedFile) -> AttemptId {
        let mut attempt = AttemptId::default();
        self.session.send_modify(|s| attempt = s.begin_attempt());

        let span = tracing::info_span!("attempt", id = attempt.get(), file = %file.name());
        async {
            info!(bytes = file.size(), mime = %file.mime(), "processing started");
            let ((), result) =
                tokio::join!(self.load_preview(attempt, &file), self.call_remote(attempt, &file));
            self.settle(attempt, result);
        }
        .instrument(span)
        .await;

        attempt
    }

    /// Save the processed image as `removed-background.png` under `dir`
    ///
    /// Returns `Ok(None)` when there is nothing to download.
    pub async fn handle_download(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let processed = self.session.borrow().state().processed_image.clone();
        match processed {
            Some(image) => ImageIOService::save_download(&image, dir).await.map(Some),
            None => {
                debug!("download requested without a processed image");
                Ok(None)
            },
        }
    }

    async fn load_preview(&self, attempt: AttemptId, file: &UploadedFile) {
        match ImageIOService::encode_preview(file).await {
            Ok(preview) => {
                if !self.session.send_if_modified(|s| s.set_original(attempt, preview)) {
                    debug!("discarding preview of superseded attempt");
                }
            },
            Err(e) => warn!(error = %e, "failed to build preview"),
        }
    }

    async fn call_remote(&self, attempt: AttemptId, file: &UploadedFile) -> Result<EncodedImage> {
        let ticker = {
            let session = Arc::clone(&self.session);
            let progress = self.progress;
            LivenessTicker::start(progress, move || {
                let mut current = false;
                session.send_if_modified(|s| {
                    current = s.is_current(attempt);
                    s.advance_progress(attempt, &progress)
                });
                current
            })
        };

        let result = self.remover.remove_background(file).await;
        ticker.stop().await;
        result
    }

    fn settle(&self, attempt: AttemptId, result: Result<EncodedImage>) {
        let applied = match result {
            Ok(processed) => {
                info!(bytes = processed.payload_len(), "background removed");
                self.session
                    .send_if_modified(|s| s.complete_success(attempt, processed))
            },
            Err(e) => {
                warn!(error = %e, status = ?e.status(), "background removal failed");
                let message = e.to_string();
                self.session
                    .send_if_modified(|s| s.complete_failure(attempt, message))
            },
        };

        if !applied {
            debug!("discarding result of superseded attempt");
        }
    }
}
