//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::EditorConfig;
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments to an `EditorConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Start from the environment, then apply command-line overrides
    pub(crate) fn from_cli(cli: &Cli) -> Result<EditorConfig> {
        let base = EditorConfig::from_env();

        let mut builder = EditorConfig::builder()
            .api_key_opt(base.api_key)
            .network_timeout(Duration::from_secs(cli.timeout))
            .jpeg_quality(cli.jpeg_quality);

        if let Some(dir) = &cli.output_dir {
            if !dir.is_dir() {
                anyhow::bail!("Output directory does not exist: {}", dir.display());
            }
            builder = builder.output_dir(dir.clone());
        }

        builder.build().context("Invalid configuration")
    }
}
