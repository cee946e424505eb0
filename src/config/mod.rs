//! Configuration management for `assetid.toml`.
//!
//! Values are layered: built-in defaults, then the config file (if any), then
//! command-line flags.
//!
//! # Sections
//!
//! | Section   | Purpose                                           |
//! |-----------|---------------------------------------------------|
//! | `[build]` | Source/output paths, hash length, minify, ignore  |
//!
//! Paths in the config file are relative to the file's directory; paths given
//! on the command line are relative to the working directory.

mod build;
mod error;

pub use build::BuildConfig;
pub use error::ConfigError;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::{MAX_HASH_LENGTH, MIN_HASH_LENGTH, PipelineOptions};
use crate::cli::Cli;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "assetid.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing assetid.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetConfig {
    /// Path of the config file that was loaded (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl AssetConfig {
    /// Load configuration from CLI arguments.
    ///
    /// An explicit `--config` must exist; the default file is optional.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_path(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_path(default)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file, resolving its paths against the
    /// file's directory.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;

        if let Some(root) = path.parent() {
            config.build.source = root.join(&config.build.source);
            config.build.output = root.join(&config.build.output);
        }
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        Self::update_option(&mut self.build.hash_length, cli.hash_length.as_ref());
        Self::update_option(&mut self.build.minify, cli.minify.as_ref());
        Self::update_option(&mut self.build.compress, cli.compress.as_ref());
        Self::update_option(&mut self.build.parallel, cli.parallel.as_ref());
        self.build.verbose |= cli.verbose;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Check values the pipeline cannot work with.
    ///
    /// The source/output layout is checked by the pipeline itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let build = &self.build;

        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&build.hash_length) {
            return Err(ConfigError::Validation(format!(
                "[build.hash_length] must be between {MIN_HASH_LENGTH} and {MAX_HASH_LENGTH}, got {}",
                build.hash_length
            )));
        }

        if build.manifest.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[build.manifest] must not be empty".to_string(),
            ));
        }

        if build.source.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "[build.source] must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Options for the pipeline.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            hash_length: self.build.hash_length,
            parallel: self.build.parallel,
            manifest_name: self.build.manifest.clone(),
            ignore: self.build.ignore.clone(),
        }
    }
}

// ============================================================================
// tests
// ============================================================================
