//! Error types for conversion and background removal operations

use thiserror::Error;

/// Result type alias for image editing operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Error taxonomy for both editing pipelines
#[derive(Error, Debug)]
pub enum EditorError {
    /// Requested target encoding is not in the supported set
    #[error("Unsupported format '{requested}'. Choose from: {supported}")]
    UnsupportedFormat { requested: String, supported: String },

    /// Invalid menu or option choice
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),

    /// Missing or placeholder configuration (credential, limits)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote image download answered with a non-2xx status
    #[error("Failed to fetch image ({status}): {url}")]
    RemoteFetch { status: u16, url: String },

    /// The removal API answered with a non-200 status
    #[error("API error ({status}): {message}")]
    RemoteApi { status: u16, message: String },

    /// Transport failures: connect, timeout, interrupted body
    #[error("Network error: {0}")]
    Network(String),

    /// Remote payload exceeded the configured cap
    #[error("Payload too large: {received} bytes (max: {limit} bytes)")]
    PayloadTooLarge { received: u64, limit: u64 },

    /// Payload is not a recognized raster image
    #[error("Decode error: {0}")]
    Decode(String),

    /// Encoder rejected the normalized image
    #[error("Encode error: {0}")]
    Encode(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Create an unsupported format error listing the accepted names
    pub fn unsupported_format<S: Into<String>>(requested: S, supported: &[&str]) -> Self {
        Self::UnsupportedFormat {
            requested: requested.into(),
            supported: supported.join(", "),
        }
    }

    pub fn invalid_choice<S: Into<String>>(msg: S) -> Self {
        Self::InvalidChoice(msg.into())
    }

    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
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

    /// Create decode error naming where the bytes came from
    pub fn decode_error(origin: &str, error: &image::ImageError) -> Self {
        Self::Decode(format!(
            "Failed to decode image from {}: {}. Supported inputs: PNG, JPEG, WebP, GIF, BMP, TIFF",
            origin, error
        ))
    }

    /// Create encode error naming the target encoder
    pub fn encode_error(encoder: &str, error: &image::ImageError) -> Self {
        Self::Encode(format!("Failed to encode as {}: {}", encoder, error))
    }

    /// Validation failures abort before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. } | Self::InvalidChoice(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// HTTP status carried by remote failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RemoteFetch { status, .. } | Self::RemoteApi { status, .. } => Some(*status),
            _ => None,
        }
    }
}
