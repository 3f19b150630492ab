//! Interactive image editor CLI
//!
//! Anything not given on the command line is asked for on the terminal.

use super::config::CliConfigBuilder;
use crate::{
    config::{ApiCredential, BackgroundFormat, TargetEncoding},
    error::EditorError,
    processor::ImageEditor,
    services::{ConsoleProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate},
    source::ImageSource,
};
use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Convert images between formats or remove their background
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgedit")]
pub struct Cli {
    /// Image file path or http(s) URL (prompted when omitted)
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// Convert to FORMAT (png, jpg, jpeg, webp, gif, bmp, tiff)
    #[arg(short, long, value_name = "FORMAT", conflicts_with = "remove_bg")]
    pub convert: Option<String>,

    /// Remove the background and save as FORMAT (png, webp)
    #[arg(short, long, value_name = "FORMAT")]
    pub remove_bg: Option<String>,

    /// Write outputs here instead of next to the input
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Network timeout in seconds, for downloads and the removal API
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    pub jpeg_quality: u8,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Convert,
    RemoveBackground,
}

impl Operation {
    /// Parse the `1`/`2` menu answer
    pub fn from_choice(choice: &str) -> std::result::Result<Self, EditorError> {
        match choice.trim() {
            "1" => Ok(Self::Convert),
            "2" => Ok(Self::RemoveBackground),
            _ => Err(EditorError::invalid_choice("Please enter 1 or 2.")),
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli)?;
    let interactive = std::io::stdin().is_terminal();
    let show_spinner = std::io::stderr().is_terminal();

    println!("=== Image Editor ===");

    let source = match &cli.input {
        Some(raw) => ImageSource::resolve(raw)
            .with_context(|| format!("File not found: {}", raw.trim()))?,
        None if interactive => prompt_source()?,
        None => anyhow::bail!("INPUT is required when stdin is not a terminal"),
    };
    debug!(source = %source, stem = source.stem(), "Resolved source");

    let operation = match (&cli.convert, &cli.remove_bg) {
        (Some(_), _) => Operation::Convert,
        (None, Some(_)) => Operation::RemoveBackground,
        (None, None) if interactive => prompt_operation()?,
        (None, None) => anyhow::bail!("Pass --convert or --remove-bg when stdin is not a terminal"),
    };

    let mut editor = ImageEditor::new(config)?;
    if show_spinner {
        editor = editor.with_progress(|| {
            Box::new(SpinnerProgressReporter::new()) as Box<dyn ProgressReporter>
        });
    } else {
        // Stages go to the log when there is no terminal to draw on
        let timed = cli.verbose >= 2;
        editor = editor.with_progress(move || {
            Box::new(ConsoleProgressReporter::new(timed)) as Box<dyn ProgressReporter>
        });
    }

    let saved = match operation {
        Operation::Convert => {
            let target: TargetEncoding = match &cli.convert {
                Some(raw) => raw.parse()?,
                None => {
                    println!("\nSupported formats: {}", TargetEncoding::SUPPORTED_NAMES.join(", "));
                    prompt("Convert to format")?.parse()?
                },
            };
            editor.convert(&source, target).await?
        },
        Operation::RemoveBackground => {
            // Reject a missing key before asking anything else
            ApiCredential::resolve(editor.config().api_key.as_deref())?;

            let format: BackgroundFormat = match &cli.remove_bg {
                Some(raw) => raw.parse()?,
                None => {
                    println!("\nOutput format options: png, webp");
                    prompt("Save as format")?.parse()?
                },
            };
            editor.remove_background(&source, format).await?
        },
    };

    println!("\n  Saved: {}", saved.display());
    Ok(())
}

/// Ask for a source until the resolver accepts one
fn prompt_source() -> Result<ImageSource> {
    loop {
        let raw = prompt("Enter the path or URL of your image")?;
        match ImageSource::resolve(&raw) {
            Some(source) => return Ok(source),
            None => println!("  File not found: {}. Please try again.", raw.trim()),
        }
    }
}

fn prompt_operation() -> Result<Operation> {
    println!("\nWhat would you like to do?");
    println!("  [1] Convert format");
    println!("  [2] Remove background");
    let choice = prompt("Enter choice (1 or 2)")?;
    Ok(Operation::from_choice(&choice)?)
}

fn prompt(label: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(label)
        .interact_text()
        .context("Failed to read from terminal")
}

/// Spinner on stderr while a pipeline runs
struct SpinnerProgressReporter {
    bar: ProgressBar,
}

impl SpinnerProgressReporter {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }
}

impl ProgressReporter for SpinnerProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if update.stage == ProcessingStage::Completed {
            self.bar.finish_and_clear();
        } else {
            self.bar.set_message(format!("{}...", update.description));
        }
    }

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {
        // The error itself is printed once by the caller
        self.bar.finish_and_clear();
    }
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    use crate::tracing_config::{TracingConfig, TracingFormat};

    let mut config = TracingConfig::new()
        .with_verbosity(verbose_count)
        .with_format(TracingFormat::Console);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        config = config.with_env_filter(filter);
    }
    config.init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_choice() {
        assert_eq!(Operation::from_choice("1").unwrap(), Operation::Convert);
        assert_eq!(Operation::from_choice(" 2\n").unwrap(), Operation::RemoveBackground);
        assert!(Operation::from_choice("3").unwrap_err().is_validation());
        assert!(Operation::from_choice("").is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["imgedit", "https://x.com/cat.jpg", "--remove-bg", "webp", "-vv"]);
        assert_eq!(cli.input.as_deref(), Some("https://x.com/cat.jpg"));
        assert_eq!(cli.remove_bg.as_deref(), Some("webp"));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout, 30);

        assert!(Cli::try_parse_from(["imgedit", "a.png", "-c", "png", "-r", "png"]).is_err());
    }
}
