#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # imgedit
//!
//! Takes one image, from a local file or an http(s) URL, and either re-encodes
//! it into another raster format or removes its background through the
//! remove.bg API.
//!
//! ## Features
//!
//! - **Format conversion**: PNG, JPEG (`jpg`/`jpeg`), WebP, GIF, BMP, TIFF
//! - **Color-mode normalization**: transparent and indexed images are flattened
//!   onto white for JPEG; indexed images are widened to RGBA for everything else
//! - **Background removal**: local files are uploaded, URLs are passed by
//!   reference; the PNG answer is re-encoded to PNG or lossless WebP
//! - **Bounded network calls**: one timeout policy for downloads and API calls
//! - **CLI Integration**: interactive front end (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgedit::{EditorConfig, ImageEditor, ImageSource, TargetEncoding};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let editor = ImageEditor::new(EditorConfig::from_env())?;
//! let source = ImageSource::resolve("photo.png").expect("file exists");
//! let saved = editor.convert(&source, TargetEncoding::Jpg).await?;
//! println!("Saved: {}", saved.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, prompts and progress spinner
//! - `tracing-json`: JSON log output for the CLI

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod processor;
pub mod removal;
pub mod services;
pub mod source;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

pub use config::{
    ApiCredential, BackgroundFormat, EditorConfig, EditorConfigBuilder, TargetEncoding,
    API_KEY_ENV, REMOVE_BG_URL,
};
pub use download::ImageDownloader;
pub use error::{EditorError, Result};
pub use processor::ImageEditor;
pub use removal::{extract_error_message, BackgroundRemovalBackend, RemoveBgClient};
pub use services::{
    ConsoleProgressReporter, EncodedImage, FormatConverter, ImageLoader, NoOpProgressReporter,
    NormalizationAction, OutputWriter, ProcessingStage, ProgressReporter, ProgressTracker,
    ProgressUpdate,
};
pub use source::{ImageSource, SourceLocation};
pub use types::{ColorMode, DecodedImage};

#[cfg(feature = "cli")]
pub use tracing_config::{TracingConfig, TracingFormat};
