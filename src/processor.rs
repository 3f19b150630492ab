//! The two editing pipelines
//!
//! `convert`: resolve → load → normalize/encode → write.
//! `remove_background`: resolve → remote removal → decode PNG → re-encode → write.
//! Each stage completes before the next one starts and nothing is written
//! until the final stage.

use crate::{
    config::{BackgroundFormat, EditorConfig, TargetEncoding},
    download::ImageDownloader,
    error::{EditorError, Result},
    removal::{decode_api_payload, BackgroundRemovalBackend, RemoveBgClient},
    services::{
        FormatConverter, ImageLoader, OutputWriter, ProcessingStage, ProgressReporter,
        ProgressTracker, CONVERTED_SUFFIX, NO_BACKGROUND_SUFFIX,
    },
    source::ImageSource,
};
use std::path::PathBuf;
use tracing::instrument;

/// Entry point for both operations
pub struct ImageEditor {
    config: EditorConfig,
    loader: ImageLoader,
    converter: FormatConverter,
    remover: Box<dyn BackgroundRemovalBackend>,
    reporter: Option<Box<dyn Fn() -> Box<dyn ProgressReporter> + Send + Sync>>,
}

impl std::fmt::Debug for ImageEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEditor")
            .field("config", &self.config)
            .field("converter", &self.converter)
            .field("remover", &"Box<dyn BackgroundRemovalBackend>")
            .finish_non_exhaustive()
    }
}

impl ImageEditor {
    /// Build an editor that talks to remove.bg
    ///
    /// # Errors
    /// - Invalid configuration values
    /// - HTTP client construction failures
    pub fn new(config: EditorConfig) -> Result<Self> {
        let remover = Box::new(RemoveBgClient::new(&config)?);
        Self::with_backend(config, remover)
    }

    /// Build an editor around a custom removal backend
    ///
    /// # Errors
    /// - Invalid configuration values
    /// - HTTP client construction failures
    pub fn with_backend(
        config: EditorConfig,
        remover: Box<dyn BackgroundRemovalBackend>,
    ) -> Result<Self> {
        config.validate()?;
        let loader = ImageLoader::new(ImageDownloader::new(&config)?);
        let converter = FormatConverter::new(config.jpeg_quality);
        Ok(Self {
            config,
            loader,
            converter,
            remover,
            reporter: None,
        })
    }

    /// Install a factory for per-operation progress reporters
    #[must_use]
    pub fn with_progress<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn ProgressReporter> + Send + Sync + 'static,
    {
        self.reporter = Some(Box::new(factory));
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn tracker(&self) -> ProgressTracker {
        match &self.reporter {
            Some(factory) => ProgressTracker::new(factory()),
            None => ProgressTracker::no_op(),
        }
    }

    fn output_dir(&self, source: &ImageSource) -> Result<PathBuf> {
        match &self.config.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => source.output_dir().map_err(EditorError::from),
        }
    }

    /// Convert `source` to `target`, writing `<stem>_converted.<ext>`
    ///
    /// # Errors
    /// - Load, decode, encode or write failures; no file is created on error
    #[instrument(skip_all, fields(source = %source, target = %target))]
    pub async fn convert(&self, source: &ImageSource, target: TargetEncoding) -> Result<PathBuf> {
        let mut tracker = self.tracker();
        let result = self.run_conversion(&mut tracker, source, target).await;
        if let Err(e) = &result {
            tracker.report_error(&e.to_string());
        }
        result
    }

    async fn run_conversion(
        &self,
        tracker: &mut ProgressTracker,
        source: &ImageSource,
        target: TargetEncoding,
    ) -> Result<PathBuf> {
        let output_dir = self.output_dir(source)?;

        tracker.report_stage(ProcessingStage::ImageLoading);
        let decoded = self.loader.load(source).await?;

        tracker.report_stage(ProcessingStage::FormatConversion);
        let encoded = self.converter.convert(decoded, target)?;

        tracker.report_stage(ProcessingStage::FileSaving);
        let path = OutputWriter::write(&encoded, &output_dir, source.stem(), CONVERTED_SUFFIX)?;

        tracker.report_stage(ProcessingStage::Completed);
        log::info!("Saved {}", path.display());
        Ok(path)
    }

    /// Remove the background of `source`, writing `<stem>_nobg.<ext>`
    ///
    /// # Errors
    /// - `EditorError::Configuration` before any request when no key is set
    /// - `EditorError::RemoteApi` for any non-200 answer
    /// - Decode, encode or write failures; no file is created on error
    #[instrument(skip_all, fields(source = %source, format = %format))]
    pub async fn remove_background(
        &self,
        source: &ImageSource,
        format: BackgroundFormat,
    ) -> Result<PathBuf> {
        let mut tracker = self.tracker();
        let result = self.run_removal(&mut tracker, source, format).await;
        if let Err(e) = &result {
            tracker.report_error(&e.to_string());
        }
        result
    }

    async fn run_removal(
        &self,
        tracker: &mut ProgressTracker,
        source: &ImageSource,
        format: BackgroundFormat,
    ) -> Result<PathBuf> {
        let output_dir = self.output_dir(source)?;

        tracker.report_stage(ProcessingStage::BackgroundRemoval);
        let payload = self.remover.remove_background(source).await?;
        let cutout = decode_api_payload(&payload)?;

        tracker.report_stage(ProcessingStage::OutputEncoding);
        let encoded = self.converter.encode_background(&cutout, format)?;

        tracker.report_stage(ProcessingStage::FileSaving);
        let path =
            OutputWriter::write(&encoded, &output_dir, source.stem(), NO_BACKGROUND_SUFFIX)?;

        tracker.report_stage(ProcessingStage::Completed);
        log::info!("Saved {}", path.display());
        Ok(path)
    }
}
