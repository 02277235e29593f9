//! Remote removal client
//!
//! `BackgroundRemover` is the seam between the controller and the network.
//! `RemoveBgClient` talks to the remote service over HTTP; `MockRemover`
//! answers from a script and records every call.

mod mock;
mod remove_bg;

pub use mock::{MockRemover, MockResponse};
pub use remove_bg::{classify_failure, RemoveBgClient};

use crate::encoding::EncodedImage;
use crate::error::Result;
use crate::intake::UploadedFile;
use async_trait::async_trait;

/// One remote exchange per call: file in, encoded image (or classified error) out
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Remove the background of `file`
    ///
    /// Fails with `InvalidInput` without any network traffic when the file
    /// does not declare an image MIME type.
    async fn remove_background(&self, file: &UploadedFile) -> Result<EncodedImage>;

    /// Short human-readable name for logs
    fn name(&self) -> &str;
}
