//! Liveness bar driven by session updates

use crate::render::Palette;
use crate::services::ProcessingStage;
use crate::session::{SessionState, Theme};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// The parts of the state the bar cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BarState {
    processing: bool,
    progress: u8,
    theme: Theme,
    failed: bool,
    completed: bool,
    has_original: bool,
}

impl BarState {
    fn of(state: &SessionState) -> Self {
        Self {
            processing: state.is_processing,
            progress: state.upload_progress,
            theme: state.theme,
            failed: state.error.is_some(),
            completed: state.processed_image.is_some(),
            has_original: state.original_image.is_some(),
        }
    }
}

/// Shows an indeterminate bar while an attempt is in flight
#[derive(Default)]
pub(crate) struct ProgressView {
    bar: Option<ProgressBar>,
    styled_for: Option<Theme>,
    last: Option<BarState>,
}

impl ProgressView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Apply one state; returns true when the settled screen needs a redraw
    pub(crate) fn update(&mut self, state: &SessionState) -> bool {
        let next = BarState::of(state);
        let previous = self.last.replace(next);
        if previous == Some(next) {
            return false;
        }

        if next.processing {
            let bar = self.bar.get_or_insert_with(|| {
                let bar = ProgressBar::new(100);
                bar.set_message(ProcessingStage::Processing.description());
                bar.enable_steady_tick(Duration::from_millis(120));
                bar
            });
            if self.styled_for != Some(next.theme) {
                bar.set_style(style_for(next.theme));
                self.styled_for = Some(next.theme);
            }
            bar.set_position(u64::from(next.progress));
            return false;
        }

        let Some(bar) = self.bar.take() else {
            // Preview landing after the bar already settled
            return next.has_original && !previous.is_some_and(|p| p.has_original);
        };
        self.styled_for = None;
        if next.failed {
            bar.abandon_with_message("failed");
        } else if next.completed {
            bar.set_position(100);
            bar.finish_with_message("done");
        } else {
            bar.abandon_with_message("cancelled");
        }
        true
    }
}

fn style_for(theme: Theme) -> ProgressStyle {
    ProgressStyle::with_template(&Palette::for_theme(theme).progress_template())
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}
