//! Services separating I/O, encoding and progress concerns from the pipelines

pub mod format;
pub mod io;
pub mod progress;

pub use format::{flatten_onto_white, EncodedImage, FormatConverter, NormalizationAction};
pub use io::{ImageLoader, OutputWriter, CONVERTED_SUFFIX, NO_BACKGROUND_SUFFIX};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProgressReporter,
    ProgressTracker, ProgressUpdate,
};
