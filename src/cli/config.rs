//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliTheme};
use crate::config::{RemovalConfig, RemovalConfigBuilder};
use crate::session::Theme;
use anyhow::{Context, Result};

/// Convert CLI arguments to a validated `RemovalConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Defaults, config file, environment, then flags
    pub(crate) fn from_cli(cli: &Cli) -> Result<RemovalConfig> {
        let base = RemovalConfig::load(cli.config.as_deref())
            .context("Failed to load configuration file")?
            .with_env();
        Self::apply(cli, base)
    }

    /// Apply flag overrides on top of an already layered configuration
    pub(crate) fn apply(cli: &Cli, base: RemovalConfig) -> Result<RemovalConfig> {
        let mut builder = RemovalConfigBuilder::from_config(base);

        if let Some(key) = cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            builder = builder.api_key(key);
        }
        if let Some(endpoint) = &cli.endpoint {
            builder = builder.endpoint(endpoint.as_str());
        }
        if let Some(secs) = cli.timeout {
            builder = builder.timeout_secs(secs);
        }
        if let Some(theme) = cli.theme {
            builder = builder.theme(theme.into());
        }
        if let Some(dir) = &cli.output {
            builder = builder.output_dir(dir.clone());
        }

        builder.build().context("Invalid configuration")
    }
}

impl From<CliTheme> for Theme {
    fn from(theme: CliTheme) -> Self {
        match theme {
            CliTheme::Light => Theme::Light,
            CliTheme::Dark => Theme::Dark,
        }
    }
}
