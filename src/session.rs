//! Session state
//!
//! `SessionState` is what the render layer sees. `Session` wraps it with the
//! attempt bookkeeping that keeps late results from older attempts out of the
//! visible state. Every transition returns whether anything visible changed,
//! which is what `watch::Sender::send_if_modified` wants.

use crate::config::ProgressConfig;
use crate::encoding::EncodedImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Visible state of one session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub theme: Theme,
    pub original_image: Option<EncodedImage>,
    pub processed_image: Option<EncodedImage>,
    pub is_processing: bool,
    /// 0-100
    pub upload_progress: u8,
    pub error: Option<String>,
}

impl SessionState {
    /// Fresh state with the given theme
    #[must_use]
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Whether a download is currently possible
    #[must_use]
    pub fn can_download(&self) -> bool {
        self.processed_image.is_some()
    }
}

/// Sequence number of one upload attempt; real attempts start at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttemptId(u64);

impl AttemptId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visible state plus attempt bookkeeping
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    active: Option<AttemptId>,
    next_attempt: u64,
}

impl Session {
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            state: SessionState::with_theme(theme),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn active_attempt(&self) -> Option<AttemptId> {
        self.active
    }

    /// Whether results tagged with `attempt` may still touch visible state
    #[must_use]
    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.active == Some(attempt)
    }

    pub fn toggle_theme(&mut self) -> bool {
        self.state.theme = self.state.theme.toggled();
        true
    }

    /// Start a new attempt, clearing the previous outcome
    ///
    /// The previous original image stays until the new preview replaces it.
    pub fn begin_attempt(&mut self) -> AttemptId {
        self.next_attempt += 1;
        let attempt = AttemptId(self.next_attempt);
        self.active = Some(attempt);

        self.state.error = None;
        self.state.processed_image = None;
        self.state.is_processing = true;
        self.state.upload_progress = 0;
        attempt
    }

    /// Store the local preview of the attempt's file
    pub fn set_original(&mut self, attempt: AttemptId, image: EncodedImage) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        self.state.original_image = Some(image);
        true
    }

    /// One liveness tick: add `step`, never beyond `cap`
    pub fn advance_progress(&mut self, attempt: AttemptId, progress: &ProgressConfig) -> bool {
        if !self.is_current(attempt) || !self.state.is_processing {
            return false;
        }
        let next = self
            .state
            .upload_progress
            .saturating_add(progress.step)
            .min(progress.cap);
        if next == self.state.upload_progress {
            return false;
        }
        self.state.upload_progress = next;
        true
    }

    /// Successful remote result
    pub fn complete_success(&mut self, attempt: AttemptId, processed: EncodedImage) -> bool {
        if !self.is_current(attempt) || !self.state.is_processing {
            return false;
        }
        self.state.upload_progress = 100;
        self.state.processed_image = Some(processed);
        self.state.error = None;
        self.state.is_processing = false;
        true
    }

    /// Failed remote call
    pub fn complete_failure<S: Into<String>>(&mut self, attempt: AttemptId, message: S) -> bool {
        if !self.is_current(attempt) || !self.state.is_processing {
            return false;
        }
        self.state.error = Some(message.into());
        self.state.processed_image = None;
        self.state.upload_progress = 0;
        self.state.is_processing = false;
        true
    }

    /// "Upload New Image": back to the initial state, keeping the theme
    ///
    /// Any in-flight attempt is invalidated.
    pub fn reset(&mut self) -> bool {
        self.active = None;
        let fresh = SessionState::with_theme(self.state.theme);
        if self.state == fresh {
            return false;
        }
        self.state = fresh;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(byte: u8) -> EncodedImage {
        EncodedImage::png(&[byte])
    }

    #[test]
    fn test_theme_toggle_round_trip() {
        let mut session = Session::new(Theme::Light);
        session.toggle_theme();
        assert_eq!(session.state().theme, Theme::Dark);
        session.toggle_theme();
        assert_eq!(session.state().theme, Theme::Light);
    }

    #[test]
    fn test_begin_clears_previous_outcome() {
        let mut session = Session::new(Theme::Light);
        let first = session.begin_attempt();
        session.complete_failure(first, "API credit limit exceeded");
        assert!(session.state().error.is_some());

        let second = session.begin_attempt();
        assert!(second > first);
        assert!(session.state().error.is_none());
        assert!(session.state().processed_image.is_none());
        assert!(session.state().is_processing);
        assert_eq!(session.state().upload_progress, 0);
    }

    #[test]
    fn test_progress_caps_below_completion() {
        let mut session = Session::new(Theme::Light);
        let attempt = session.begin_attempt();
        let progress = ProgressConfig::default();
        for _ in 0..20 {
            session.advance_progress(attempt, &progress);
        }
        assert_eq!(session.state().upload_progress, 90);
        assert!(!session.advance_progress(attempt, &progress));

        session.complete_success(attempt, png(1));
        assert_eq!(session.state().upload_progress, 100);
        assert!(!session.advance_progress(attempt, &progress));
        assert_eq!(session.state().upload_progress, 100);
    }

    #[test]
    fn test_processed_only_set_when_idle_without_error() {
        let mut session = Session::new(Theme::Light);
        let attempt = session.begin_attempt();
        assert!(session.complete_success(attempt, png(7)));
        let state = session.state();
        assert!(!state.is_processing);
        assert!(state.error.is_none());
        assert_eq!(state.processed_image, Some(png(7)));

        // A settled attempt cannot settle again
        assert!(!session.complete_failure(attempt, "late"));
        assert!(session.state().error.is_none());
    }

    #[test]
    fn test_stale_attempt_is_ignored() {
        let mut session = Session::new(Theme::Light);
        let stale = session.begin_attempt();
        let fresh = session.begin_attempt();

        assert!(!session.set_original(stale, png(1)));
        assert!(!session.complete_success(stale, png(2)));
        assert!(session.state().is_processing);
        assert!(session.state().processed_image.is_none());

        assert!(session.complete_failure(fresh, "Invalid API key"));
        assert_eq!(session.state().error.as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn test_reset_restores_initial_state_except_theme() {
        let mut session = Session::new(Theme::Light);
        session.toggle_theme();
        let attempt = session.begin_attempt();
        session.set_original(attempt, png(1));
        session.complete_success(attempt, png(2));

        assert!(session.reset());
        assert_eq!(*session.state(), SessionState::with_theme(Theme::Dark));
        assert!(session.active_attempt().is_none());

        // A result for the invalidated attempt cannot resurrect images
        assert!(!session.set_original(attempt, png(3)));
        assert!(!session.reset());
    }
}
