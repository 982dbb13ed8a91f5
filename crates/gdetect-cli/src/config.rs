//! Configuration file handling for gdetect

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// GLIMPS Detect endpoint URL
    pub url: Option<String>,
    /// API token
    pub token: Option<String>,
    /// Skip TLS certificate verification
    pub insecure: Option<bool>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("gdetect");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        url: Option<&str>,
        token: Option<&str>,
        insecure: bool,
        output: Option<OutputFormat>,
        no_color: bool,
    ) -> Result<MergedConfig> {
        let Some(url) = url.map(String::from).or_else(|| self.url.clone()) else {
            bail!("No endpoint URL given (use --url, GDETECT_URL or the config file)");
        };
        let Some(token) = token.map(String::from).or_else(|| self.token.clone()) else {
            bail!("No API token given (use --token, GDETECT_TOKEN or the config file)");
        };
        let output = match (output, self.output.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name, true)
                .map_err(|_| anyhow::anyhow!("Unknown output format in config: {name}"))?,
            (None, None) => OutputFormat::default(),
        };

        Ok(MergedConfig {
            url,
            token,
            insecure: insecure || self.insecure.unwrap_or(false),
            output,
            no_color: no_color || self.no_color.unwrap_or(false),
        })
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub url: String,
    pub token: String,
    pub insecure: bool,
    pub output: OutputFormat,
    pub no_color: bool,
}
