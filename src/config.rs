//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.storefront.toml` files.

use crate::analysis::{EngineOptions, DEFAULT_UNKNOWN_CATEGORY};
use crate::cli::OutputFormat;
use crate::geo::{BaseMap, BoundingBox, DEFAULT_BASE_IMAGE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".storefront.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Customer map settings.
    #[serde(default)]
    pub map: MapConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "dashboard_report.md".to_string()
}

/// Aggregation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Refuse to aggregate more rows than this.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Categories shown in the best and worst seller panels.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Bucket name for rows without a category.
    #[serde(default = "default_unknown_category")]
    pub unknown_category: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            top_n: default_top_n(),
            unknown_category: default_unknown_category(),
        }
    }
}

fn default_max_rows() -> usize {
    5_000_000
}

fn default_top_n() -> usize {
    5
}

fn default_unknown_category() -> String {
    DEFAULT_UNKNOWN_CATEGORY.to_string()
}

/// Customer map settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Base map image URL or path.
    #[serde(default = "default_base_image")]
    pub base_image: String,

    /// Maximum markers to place. Unset places every location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_points: Option<usize>,

    /// Geographic extent of the base image.
    #[serde(default)]
    pub bbox: BoundingBox,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base_image: default_base_image(),
            max_points: None,
            bbox: BoundingBox::default(),
        }
    }
}

fn default_base_image() -> String {
    DEFAULT_BASE_IMAGE.to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .map
            .bbox
            .validate()
            .with_context(|| format!("Invalid [map.bbox] in {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }

        if let Some(max_rows) = args.max_rows {
            self.engine.max_rows = max_rows;
        }
        if let Some(top_n) = args.top_n {
            self.engine.top_n = top_n;
        }
        if let Some(ref label) = args.unknown_category {
            self.engine.unknown_category = label.clone();
        }

        if let Some(max_points) = args.max_points {
            self.map.max_points = Some(max_points);
        }
    }

    /// Log level once the file and the CLI are merged. `--quiet` wins over
    /// `verbose` from either source.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if !args.quiet && self.general.verbose {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Options for constructing the aggregation engine.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_rows: Some(self.engine.max_rows),
            unknown_category: self.engine.unknown_category.clone(),
        }
    }

    /// Base map described by the `[map]` section.
    pub fn base_map(&self) -> BaseMap {
        BaseMap {
            source: self.map.base_image.clone(),
            bbox: self.map.bbox,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
