//! Configuration types for conversion and background removal operations

use crate::error::{EditorError, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Fixed remove.bg endpoint
pub const REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";

/// Environment variable holding the remove.bg credential
pub const API_KEY_ENV: &str = "REMOVE_BG_API_KEY";

/// Value shipped in the sample env file; treated as unset
pub const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

/// Upper bound on every network call
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest remote image accepted (25 MiB)
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 25 * 1024 * 1024;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Normalize user-typed format names: trim, lowercase, drop a leading dot
fn normalize_format_name(raw: &str) -> String {
    raw.trim().to_lowercase().trim_start_matches('.').to_string()
}

/// Target encodings accepted by the format converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetEncoding {
    Png,
    /// Display alias of `Jpeg`; keeps the `.jpg` extension
    Jpg,
    Jpeg,
    Webp,
    Gif,
    Bmp,
    Tiff,
}

impl TargetEncoding {
    pub const ALL: [Self; 7] = [
        Self::Png,
        Self::Jpg,
        Self::Jpeg,
        Self::Webp,
        Self::Gif,
        Self::Bmp,
        Self::Tiff,
    ];

    pub const SUPPORTED_NAMES: [&'static str; 7] =
        ["png", "jpg", "jpeg", "webp", "gif", "bmp", "tiff"];

    /// File extension, exactly as the user asked for it
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// Canonical encoder; `jpg` and `jpeg` share one
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpg | Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
            Self::Gif => ImageFormat::Gif,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
        }
    }

    /// JPEG-family targets cannot carry an alpha channel
    pub fn is_jpeg_family(self) -> bool {
        matches!(self, Self::Jpg | Self::Jpeg)
    }
}

impl FromStr for TargetEncoding {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        let name = normalize_format_name(s);
        Self::ALL
            .into_iter()
            .find(|encoding| encoding.extension() == name)
            .ok_or_else(|| EditorError::unsupported_format(name, &Self::SUPPORTED_NAMES))
    }
}

impl std::fmt::Display for TargetEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output encodings for background removal results (both keep alpha)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundFormat {
    #[default]
    Png,
    /// Always written lossless
    Webp,
}

impl BackgroundFormat {
    pub const SUPPORTED_NAMES: [&'static str; 2] = ["png", "webp"];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

impl FromStr for BackgroundFormat {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_format_name(s).as_str() {
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            _ => Err(EditorError::invalid_choice(
                "Choose 'png' or 'webp' for background removal output",
            )),
        }
    }
}

impl std::fmt::Display for BackgroundFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Runtime configuration shared by both pipelines
#[derive(Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Applies to downloads and removal calls alike
    pub network_timeout: Duration,
    pub removal_endpoint: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_download_bytes: u64,
    pub jpeg_quality: u8,
    /// Replaces the per-source output directory when set
    pub output_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            removal_endpoint: REMOVE_BG_URL.to_string(),
            api_key: None,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            output_dir: None,
        }
    }
}

impl std::fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorConfig")
            .field("network_timeout", &self.network_timeout)
            .field("removal_endpoint", &self.removal_endpoint)
            .field("api_key", &redacted(self.api_key.as_deref()))
            .field("max_download_bytes", &self.max_download_bytes)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// Stand-in shown wherever a credential would be formatted
pub(crate) fn redacted(api_key: Option<&str>) -> Option<&'static str> {
    api_key.map(|_| "***")
}

impl EditorConfig {
    /// Create a new configuration builder
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::new()
    }

    /// Defaults plus the credential from the process environment
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            ..Self::default()
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// - Zero network timeout
    /// - Zero download cap
    /// - JPEG quality outside 1-100
    pub fn validate(&self) -> Result<()> {
        if self.network_timeout.is_zero() {
            return Err(EditorError::configuration(
                "Network timeout must be greater than zero",
            ));
        }
        if self.max_download_bytes == 0 {
            return Err(EditorError::configuration(
                "Maximum download size must be greater than zero",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(EditorError::configuration(format!(
                "Invalid JPEG quality: {} (valid range: 1-100). Recommended: {}",
                self.jpeg_quality, DEFAULT_JPEG_QUALITY
            )));
        }
        Ok(())
    }
}

/// Builder for `EditorConfig`
#[derive(Debug, Default)]
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn network_timeout(mut self, timeout: Duration) -> Self {
        self.config.network_timeout = timeout;
        self
    }

    #[must_use]
    pub fn removal_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.removal_endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn api_key_opt(mut self, api_key: Option<String>) -> Self {
        self.config.api_key = api_key;
        self
    }

    #[must_use]
    pub fn max_download_bytes(mut self, limit: u64) -> Self {
        self.config.max_download_bytes = limit;
        self
    }

    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Any value rejected by [`EditorConfig::validate`]
    pub fn build(self) -> Result<EditorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// A remove.bg credential that passed the presence checks
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Accept a configured key unless it is unset, blank or the placeholder
    ///
    /// # Errors
    /// - `EditorError::Configuration` with remediation text
    pub fn resolve(api_key: Option<&str>) -> Result<Self> {
        match api_key.map(str::trim) {
            Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER => {
                Ok(Self(key.to_string()))
            },
            _ => Err(EditorError::configuration(format!(
                "{API_KEY_ENV} is not set. Copy .env.copy to .env and add your API key from https://www.remove.bg/api"
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_encoding_parsing() {
        assert_eq!("png".parse::<TargetEncoding>().unwrap(), TargetEncoding::Png);
        assert_eq!(" .JPG ".parse::<TargetEncoding>().unwrap(), TargetEncoding::Jpg);
        assert_eq!("tiff".parse::<TargetEncoding>().unwrap(), TargetEncoding::Tiff);

        let err = "heic".parse::<TargetEncoding>().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("png, jpg, jpeg, webp, gif, bmp, tiff"));
    }

    #[test]
    fn test_jpg_and_jpeg_share_encoder() {
        assert_eq!(
            TargetEncoding::Jpg.image_format(),
            TargetEncoding::Jpeg.image_format()
        );
        assert_eq!(TargetEncoding::Jpg.extension(), "jpg");
        assert_eq!(TargetEncoding::Jpeg.extension(), "jpeg");

        let jpeg_family: Vec<_> = TargetEncoding::ALL
            .into_iter()
            .filter(|t| t.is_jpeg_family())
            .collect();
        assert_eq!(jpeg_family, vec![TargetEncoding::Jpg, TargetEncoding::Jpeg]);
    }

    #[test]
    fn test_background_format_parsing() {
        assert_eq!("webp".parse::<BackgroundFormat>().unwrap(), BackgroundFormat::Webp);
        assert_eq!(".PNG".parse::<BackgroundFormat>().unwrap(), BackgroundFormat::Png);
        assert!("jpg".parse::<BackgroundFormat>().unwrap_err().is_validation());
    }

    #[test]
    fn test_config_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.network_timeout, Duration::from_secs(30));
        assert_eq!(config.removal_endpoint, REMOVE_BG_URL);
        assert_eq!(config.max_download_bytes, 25 * 1024 * 1024);
        assert!(config.output_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        assert!(EditorConfig::builder()
            .network_timeout(Duration::ZERO)
            .build()
            .is_err());

        let err = EditorConfig::builder().jpeg_quality(0).build().unwrap_err();
        assert!(err.to_string().contains("1-100"));

        let config = EditorConfig::builder()
            .api_key("abc")
            .jpeg_quality(75)
            .output_dir("/tmp/out")
            .build()
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.jpeg_quality, 75);
    }

    #[test]
    fn test_credential_resolution() {
        assert!(ApiCredential::resolve(None).unwrap_err().is_configuration());
        assert!(ApiCredential::resolve(Some("")).is_err());
        assert!(ApiCredential::resolve(Some(API_KEY_PLACEHOLDER)).is_err());

        let credential = ApiCredential::resolve(Some("real-key")).unwrap();
        assert_eq!(credential.expose(), "real-key");
        assert_eq!(format!("{credential:?}"), "ApiCredential(***)");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = EditorConfig::builder().api_key("sk-secret-123").build().unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret-123"), "{printed}");
        assert!(printed.contains("api_key: Some(\"***\")"));

        let builder = EditorConfig::builder().api_key("sk-secret-123");
        assert!(!format!("{builder:?}").contains("sk-secret-123"));

        assert!(format!("{:?}", EditorConfig::default()).contains("api_key: None"));
    }
}
