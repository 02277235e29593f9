//! Render layer
//!
//! Pure functions from visible session state to what the terminal shows.
//! The theme arrives with the state; nothing here reads global settings.

use crate::encoding::EncodedImage;
use crate::services::{ImageIOService, ImageSummary, ProcessingStage, DOWNLOAD_FILE_NAME};
use crate::session::{SessionState, Theme};
use std::fmt::Write as _;

/// Which screen the state calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    /// Drop zone
    Upload,
    /// Spinner and liveness bar
    Processing { progress: u8 },
    /// Side-by-side comparison with reset/download controls
    ///
    /// Only reachable once the original preview exists.
    Compare {
        original: &'a EncodedImage,
        processed: Option<&'a EncodedImage>,
    },
}

impl<'a> View<'a> {
    #[must_use]
    pub fn from_state(state: &'a SessionState) -> Self {
        if state.is_processing {
            return Self::Processing {
                progress: state.upload_progress,
            };
        }
        match &state.original_image {
            None => Self::Upload,
            Some(original) => Self::Compare {
                original,
                processed: state.processed_image.as_ref(),
            },
        }
    }
}

/// Colours for one theme, in `indicatif` style names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: &'static str,
    pub track: &'static str,
}

impl Palette {
    #[must_use]
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                accent: "blue",
                track: "black",
            },
            Theme::Dark => Self {
                accent: "cyan",
                track: "white",
            },
        }
    }

    /// Template for the liveness bar
    #[must_use]
    pub fn progress_template(&self) -> String {
        format!(
            "{{spinner:.{accent}}} {{msg}} [{{bar:40.{accent}/{track}}}] {{pos:>3}}% (indeterminate)",
            accent = self.accent,
            track = self.track
        )
    }
}

/// Human-readable byte size
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS.first().unwrap_or(&"B"))
    } else {
        format!("{:.1} {}", size, UNITS.get(unit_index).unwrap_or(&"B"))
    }
}

fn describe(summary: &ImageSummary) -> String {
    let mut text = format!("{}, {}", summary.mime, format_size(summary.byte_len as u64));
    if let Some((width, height)) = summary.dimensions {
        let _ = write!(text, ", {}x{}", width, height);
    }
    text
}

/// Full screen for the current state
///
/// `max_upload_bytes` is only used for the drop-zone hint.
#[must_use]
pub fn render(state: &SessionState, max_upload_bytes: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Background Remover  [{} mode]", state.theme);

    if let Some(error) = &state.error {
        let _ = writeln!(out, "  ! {}", error);
    }

    match View::from_state(state) {
        View::Upload => {
            let _ = writeln!(out, "  {}", ProcessingStage::Idle.description());
            let _ = writeln!(out, "  or type `open <path>` to select a file");
            let _ = writeln!(
                out,
                "  Supports PNG, JPG, JPEG (max {})",
                format_size(max_upload_bytes)
            );
        },
        View::Processing { progress } => {
            let _ = writeln!(
                out,
                "  {} {}% (indeterminate)",
                ProcessingStage::Processing.description(),
                progress
            );
        },
        View::Compare {
            original,
            processed,
        } => {
            let _ = writeln!(out, "  Original:  {}", describe(&ImageIOService::summarize(original)));
            match processed {
                Some(image) => {
                    let _ = writeln!(out, "  Processed: {}", describe(&ImageIOService::summarize(image)));
                },
                None => {
                    let _ = writeln!(out, "  Processed: (not available, showing original)");
                },
            }
            let download = if processed.is_some() {
                format!("`download` saves {}", DOWNLOAD_FILE_NAME)
            } else {
                "download unavailable".to_string()
            };
            let _ = writeln!(out, "  `reset` uploads a new image | {}", download);
        },
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_selection() {
        let mut state = SessionState::default();
        assert_eq!(View::from_state(&state), View::Upload);

        state.is_processing = true;
        state.upload_progress = 40;
        assert_eq!(View::from_state(&state), View::Processing { progress: 40 });

        state.is_processing = false;
        state.original_image = Some(EncodedImage::png(&[1]));
        assert!(matches!(
            View::from_state(&state),
            View::Compare {
                processed: None,
                ..
            }
        ));
    }

    #[test]
    fn test_result_without_original_stays_on_upload() {
        let state = SessionState {
            processed_image: Some(EncodedImage::png(&[1])),
            upload_progress: 100,
            ..SessionState::default()
        };
        assert_eq!(View::from_state(&state), View::Upload);
        assert!(!render(&state, 1024).contains("Processed:"));
    }

    #[test]
    fn test_palette_follows_theme() {
        let light = Palette::for_theme(Theme::Light);
        let dark = Palette::for_theme(Theme::Dark);
        assert_ne!(light, dark);
        assert!(dark.progress_template().contains("bar:40.cyan/white"));
        assert!(light.progress_template().contains("(indeterminate)"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(25 * 1024 * 1024), "25.0 MB");
    }

    #[test]
    fn test_render_error_banner_and_upload_hint() {
        let state = SessionState {
            error: Some("API credit limit exceeded".to_string()),
            ..SessionState::with_theme(Theme::Dark)
        };
        let screen = render(&state, 25 * 1024 * 1024);
        assert!(screen.contains("[dark mode]"));
        assert!(screen.contains("! API credit limit exceeded"));
        assert!(screen.contains("max 25.0 MB"));
    }

    #[test]
    fn test_render_compare_without_result_disables_download() {
        let state = SessionState {
            original_image: Some(EncodedImage::from_bytes("image/jpeg", &[1, 2])),
            ..SessionState::default()
        };
        let screen = render(&state, 1024);
        assert!(screen.contains("Original:  image/jpeg, 2 B"));
        assert!(screen.contains("showing original"));
        assert!(screen.contains("download unavailable"));
    }
}
