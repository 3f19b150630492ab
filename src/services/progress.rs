//! Progress reporting service
//!
//! Keeps progress reporting out of the pipelines so each frontend can render
//! stages its own way.

use std::time::Instant;

/// Stages of the two editing pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Reading or downloading the source image
    ImageLoading,
    /// Normalizing the color mode and encoding
    FormatConversion,
    /// Waiting on the remote segmentation service
    BackgroundRemoval,
    /// Re-encoding the API result into the requested format
    OutputEncoding,
    /// Writing the output file
    FileSaving,
    Completed,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::ImageLoading => "Loading input image",
            Self::FormatConversion => "Converting format",
            Self::BackgroundRemoval => "Removing background",
            Self::OutputEncoding => "Encoding result",
            Self::FileSaving => "Saving result",
            Self::Completed => "Done",
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub stage: ProcessingStage,
    pub description: String,
    /// Elapsed time since the operation started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            stage,
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        }
    }
}

/// Trait for reporting progress during editing operations
pub trait ProgressReporter: Send + Sync {
    fn report_progress(&self, update: ProgressUpdate);

    /// Report an error during processing
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Progress reporter that forwards stages to the log
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!("{} ({}ms elapsed)", update.description, update.elapsed_ms);
        } else {
            log::info!("{}", update.description);
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("Error during {}: {}", stage.description(), error);
    }
}

/// Progress tracker that manages timing and progress reporting
pub struct ProgressTracker {
    reporter: Box<dyn ProgressReporter>,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
            current_stage: None,
        }
    }

    /// Create a progress tracker with no-op reporter (for testing/disabled progress)
    #[must_use]
    pub fn no_op() -> Self {
        Self::new(Box::new(NoOpProgressReporter))
    }

    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage);
        self.reporter
            .report_progress(ProgressUpdate::new(stage, self.start_time));
    }

    /// Report an error against the stage that was running
    pub fn report_error(&self, error: &str) {
        let stage = self.current_stage.unwrap_or(ProcessingStage::ImageLoading);
        self.reporter.report_error(stage, error);
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<ProcessingStage> {
        self.current_stage
    }
}
