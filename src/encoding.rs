//! Encoded image data
//!
//! Images travel through the session as self-contained `data:` URLs, the same
//! representation a browser would accept as an `<img src>`.

use crate::error::{RemovalError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

const PNG_MIME: &str = "image/png";

/// A `data:<mime>;base64,<payload>` string embedding image bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap raw bytes under the given MIME type
    #[must_use]
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    /// Wrap bytes returned by the remote service, which always answers with PNG
    #[must_use]
    pub fn png(bytes: &[u8]) -> Self {
        Self::from_bytes(PNG_MIME, bytes)
    }

    /// Parse an existing data URL, checking only its shape
    pub fn parse<S: Into<String>>(url: S) -> Result<Self> {
        let url = url.into();
        split_data_url(&url)?;
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type declared in the URL header
    #[must_use]
    pub fn mime(&self) -> &str {
        split_data_url(&self.0).map_or("", |(mime, _)| mime)
    }

    /// Length of the base64 payload in characters
    #[must_use]
    pub fn payload_len(&self) -> usize {
        split_data_url(&self.0).map_or(0, |(_, payload)| payload.len())
    }

    /// Decode the payload back into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, payload) = split_data_url(&self.0)?;
        STANDARD
            .decode(payload)
            .map_err(|e| RemovalError::decode(format!("invalid base64 payload: {}", e)))
    }
}

impl fmt::Display for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedImage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn split_data_url(url: &str) -> Result<(&str, &str)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RemovalError::decode("missing 'data:' scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| RemovalError::decode("missing ',' separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| RemovalError::decode("only base64 data URLs are supported"))?;
    Ok((mime, payload))
}
