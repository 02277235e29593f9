//! Service layer
//!
//! Infrastructure concerns (file I/O, progress ticking) kept out of the
//! session controller.

pub mod io;
pub mod progress;

pub use io::{ImageIOService, ImageSummary, DOWNLOAD_FILE_NAME};
pub use progress::{LivenessTicker, ProcessingStage};
