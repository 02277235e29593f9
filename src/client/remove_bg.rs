//! HTTP client for the remove.bg background removal API

use super::BackgroundRemover;
use crate::config::RemovalConfig;
use crate::encoding::EncodedImage;
use crate::error::{RemovalError, Result};
use crate::intake::UploadedFile;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

/// Longest plain-text error body carried into a message
const MAX_ERROR_DETAIL: usize = 200;

/// Client performing exactly one POST per `remove_background` call
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    client: Client,
    endpoint: Url,
    authenticated: bool,
}

impl RemoveBgClient {
    /// Create a client from a validated configuration
    ///
    /// # Errors
    /// - Invalid configuration (endpoint, missing key, malformed header)
    /// - Failed to create HTTP client
    pub fn new(config: &RemovalConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;

        let mut headers = HeaderMap::new();
        match &config.api_key {
            Some(key) => {
                let name = HeaderName::from_bytes(config.api_key_header.as_bytes()).map_err(|e| {
                    RemovalError::invalid_config(format!(
                        "API key header '{}': {}",
                        config.api_key_header, e
                    ))
                })?;
                let mut value = HeaderValue::from_str(key).map_err(|_| {
                    RemovalError::invalid_config("API key contains characters not allowed in a header")
                })?;
                value.set_sensitive(true);
                headers.insert(name, value);
            },
            None => {
                log::info!(
                    "No API key configured; relying on {} to authenticate",
                    endpoint
                );
            },
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| RemovalError::invalid_config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            authenticated: config.api_key.is_some(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether requests carry a client-side credential
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Multipart body: the file, automatic sizing and PNG output
    fn build_form(file: &UploadedFile) -> Result<Form> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.mime())
            .map_err(|_| RemovalError::InvalidInput {
                mime: file.mime().to_string(),
            })?;

        Ok(Form::new()
            .part("image_file", part)
            .text("size", "auto")
            .text("format", "png"))
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, file: &UploadedFile) -> Result<EncodedImage> {
        if !file.declares_image() {
            log::warn!(
                "Refusing '{}': declared type '{}' is not an image",
                file.name(),
                file.mime()
            );
            return Err(RemovalError::InvalidInput {
                mime: file.mime().to_string(),
            });
        }

        let form = Self::build_form(file)?;
        let request = self.client.post(self.endpoint.clone()).multipart(form);

        log::info!(
            "Uploading '{}' ({} bytes) to {}",
            file.name(),
            file.size(),
            self.endpoint
        );

        let response = request.send().await.map_err(|e| {
            log::error!("Background removal request failed before a response: {}", e);
            RemovalError::connectivity(e.to_string())
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            log::error!("Failed to read response body (status {}): {}", status, e);
            RemovalError::remote(
                Some(status.as_u16()),
                format!("failed to read response body: {}", e),
            )
        })?;

        if !status.is_success() {
            let error = classify_failure(status, &body);
            log::error!("Background removal error: {} (status {})", error, status);
            return Err(error);
        }

        log::info!("Received {} bytes of processed image", body.len());
        Ok(EncodedImage::png(&body))
    }

    fn name(&self) -> &str {
        "remove.bg"
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorItem>,
}

#[derive(Deserialize)]
struct ErrorItem {
    title: String,
    #[serde(default)]
    detail: Option<String>,
}

/// Map a non-success response to the error taxonomy
///
/// Only 400, 401 and 402 have dedicated variants; everything else is a
/// `RemoteError` carrying the status and whatever the body explains.
#[must_use]
pub fn classify_failure(status: StatusCode, body: &[u8]) -> RemovalError {
    match status {
        StatusCode::PAYMENT_REQUIRED => RemovalError::QuotaExceeded,
        StatusCode::UNAUTHORIZED => RemovalError::Unauthorized,
        StatusCode::BAD_REQUEST => RemovalError::InvalidImageFormat,
        other => {
            let mut message = format!("Request failed with status code {}", other.as_u16());
            if let Some(detail) = describe_error_body(body) {
                message.push_str(": ");
                message.push_str(&detail);
            }
            RemovalError::remote(Some(other.as_u16()), message)
        },
    }
}

fn describe_error_body(body: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        let titles: Vec<String> = parsed
            .errors
            .into_iter()
            .map(|item| match item.detail {
                Some(detail) => format!("{} ({})", item.title, detail),
                None => item.title,
            })
            .collect();
        if !titles.is_empty() {
            return Some(titles.join("; "));
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_ERROR_DETAIL).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RemoveBgClient {
        let config = RemovalConfig::builder().api_key("test-key").build().unwrap();
        RemoveBgClient::new(&config).unwrap()
    }

    #[test]
    fn test_dedicated_statuses() {
        assert!(matches!(
            classify_failure(StatusCode::PAYMENT_REQUIRED, b""),
            RemovalError::QuotaExceeded
        ));
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED, b""),
            RemovalError::Unauthorized
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, b""),
            RemovalError::InvalidImageFormat
        ));
    }

    #[test]
    fn test_other_statuses_are_remote_errors() {
        for code in [403u16, 404, 429, 500, 502, 503] {
            let status = StatusCode::from_u16(code).unwrap();
            match classify_failure(status, b"") {
                RemovalError::RemoteError { status, message } => {
                    assert_eq!(status, Some(code));
                    assert_eq!(message, format!("Request failed with status code {}", code));
                },
                other => panic!("status {} classified as {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_json_error_body_titles() {
        let body = br#"{"errors":[{"title":"Rate limit exceeded","code":"rate_limit"},{"title":"Try later","detail":"60s"}]}"#;
        let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(
            err.to_string(),
            "Failed to process image: Request failed with status code 429: Rate limit exceeded; Try later (60s)"
        );
    }

    #[test]
    fn test_text_error_body_truncated() {
        let body = "x".repeat(500);
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, body.as_bytes());
        let RemovalError::RemoteError { message, .. } = err else {
            panic!("expected remote error");
        };
        assert!(message.ends_with(&"x".repeat(MAX_ERROR_DETAIL)));
        assert!(!message.contains(&"x".repeat(MAX_ERROR_DETAIL + 1)));
    }

    #[tokio::test]
    async fn test_non_image_rejected_without_network() {
        // Unroutable endpoint: reaching the network would surface as a connectivity error
        let config = RemovalConfig::builder()
            .endpoint("http://127.0.0.1:9/removebg")
            .build()
            .unwrap();
        let client = RemoveBgClient::new(&config).unwrap();
        let file = UploadedFile::new("notes.png", "text/plain", b"hello".to_vec());
        let err = client.remove_background(&file).await.unwrap_err();
        assert!(matches!(err, RemovalError::InvalidInput { mime } if mime == "text/plain"));
    }

    #[test]
    fn test_form_construction_accepts_image_mime() {
        let file = UploadedFile::new("cat.png", "image/png", vec![1, 2, 3]);
        assert!(RemoveBgClient::build_form(&file).is_ok());
        let client = client();
        assert_eq!(client.endpoint().as_str(), crate::config::DEFAULT_ENDPOINT);
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let config = RemovalConfig::builder()
            .api_key("k")
            .api_key_header("bad header")
            .build()
            .unwrap();
        assert!(matches!(
            RemoveBgClient::new(&config),
            Err(RemovalError::InvalidConfig(_))
        ));
    }
}
