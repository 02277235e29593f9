//! Error types for remote background removal

use thiserror::Error;

/// Result type alias for background removal operations
pub type Result<T> = std::result::Result<T, RemovalError>;

/// Errors surfaced by the removal client and the session controller
///
/// The `Display` text of the remote-call variants is the message shown to the
/// user, so it is kept short and free of debugging detail.
#[derive(Error, Debug)]
pub enum RemovalError {
    /// The file handed to the client does not declare an image MIME type
    #[error("Please upload a valid image file")]
    InvalidInput {
        /// Declared MIME type of the rejected file
        mime: String,
    },

    /// HTTP 401 from the remote service
    #[error("Invalid API key")]
    Unauthorized,

    /// HTTP 402 from the remote service
    #[error("API credit limit exceeded")]
    QuotaExceeded,

    /// HTTP 400 from the remote service
    #[error("Invalid image format")]
    InvalidImageFormat,

    /// Any other non-success exchange with the remote service
    #[error("Failed to process image: {message}")]
    RemoteError {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Underlying status/body description
        message: String,
    },

    /// No response reached us
    #[error("Failed to connect to the background removal service. Please try again.")]
    ConnectivityError {
        /// Transport-level cause, kept for logs
        reason: String,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encoded image data could not be decoded
    #[error("Malformed image data: {0}")]
    Decode(String),

    /// File refused before any request was made
    #[error(transparent)]
    Rejected(#[from] crate::intake::IntakeError),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task died before producing its result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RemovalError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a remote error from an HTTP status and a detail message
    pub fn remote<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::RemoteError {
            status,
            message: message.into(),
        }
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a connectivity error from a transport-level cause
    pub fn connectivity<S: Into<String>>(reason: S) -> Self {
        Self::ConnectivityError {
            reason: reason.into(),
        }
    }

    /// HTTP status carried by this error, if it came from a response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::QuotaExceeded => Some(402),
            Self::InvalidImageFormat => Some(400),
            Self::RemoteError { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the error originates from the remote exchange rather than local state
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized
                | Self::QuotaExceeded
                | Self::InvalidImageFormat
                | Self::RemoteError { .. }
                | Self::ConnectivityError { .. }
        )
    }
}
