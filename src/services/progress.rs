//! Progress service
//!
//! The remote service reports no upload or processing progress, so the
//! percentage shown while an attempt is in flight comes from a liveness
//! ticker: it only says "still working". The render layer labels it as such.

use crate::config::ProgressConfig;
use crate::session::SessionState;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Coarse phase of the session, derived from visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Waiting for a file
    Idle,
    /// File dropped, preview and remote call in flight
    Processing,
    /// Remote call succeeded
    Completed,
    /// Remote call failed
    Failed,
}

impl ProcessingStage {
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        if state.is_processing {
            Self::Processing
        } else if state.error.is_some() {
            Self::Failed
        } else if state.processed_image.is_some() {
            Self::Completed
        } else {
            Self::Idle
        }
    }

    /// Get a human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Drag & drop your image here",
            Self::Processing => "Processing your image...",
            Self::Completed => "Background removed",
            Self::Failed => "Processing failed",
        }
    }
}

/// Recurring task advancing the cosmetic progress value
///
/// `stop` cancels the task and waits for it, so no tick lands after the
/// caller has written the final progress value.
#[derive(Debug)]
pub struct LivenessTicker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl LivenessTicker {
    /// Start ticking every `config.interval()`; the first tick fires after one interval
    ///
    /// `on_tick` returns `false` to end the ticker early (e.g. when its
    /// attempt is no longer current).
    pub fn start<F>(config: ProgressConfig, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let period = config.interval();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    biased;
                    () = child.cancelled() => break,
                    _ = interval.tick() => {
                        if !on_tick() {
                            break;
                        }
                    },
                }
            }
        });

        Self { token, handle }
    }

    /// Cancel and wait until the task has finished
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "liveness ticker ended abnormally");
        }
    }
}
