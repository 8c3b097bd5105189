use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::schema::{DEFAULT_KEY_COLUMN, DEFAULT_MEASURE_MARKER};

pub const DEFAULT_BASE_DIR: &str = "static";
pub const DEFAULT_INPUT_FILE: &str = "scraped_data.csv";
pub const DEFAULT_TOTALS_FILE: &str = "transformed_data.csv";
pub const DEFAULT_GROWTH_FILE: &str = "growth_data.csv";
pub const DEFAULT_DATABASE_FILE: &str = "transformed_data.db";
pub const DEFAULT_TABLE: &str = "transformed_data";
pub const DEFAULT_LOG_FILE: &str = "pipeline.log";

/// Locations and column conventions for one pipeline run.
///
/// Values come from, in increasing priority: built-in defaults, an optional
/// TOML file, `SALESFLOW_*` environment variables, then explicit overrides made
/// by the caller (the CLI).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub totals_file: String,
    pub growth_file: String,
    pub database_file: String,
    pub table_name: String,
    pub log_dir: PathBuf,
    pub key_column: String,
    pub measure_marker: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let base = PathBuf::from(DEFAULT_BASE_DIR);
        Self {
            input_path: base.join("input").join(DEFAULT_INPUT_FILE),
            output_dir: base.join("output"),
            totals_file: DEFAULT_TOTALS_FILE.to_string(),
            growth_file: DEFAULT_GROWTH_FILE.to_string(),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            table_name: DEFAULT_TABLE.to_string(),
            log_dir: base.join("logs"),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            measure_marker: DEFAULT_MEASURE_MARKER.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|err| PipelineError::Config(format!("invalid config: {err}")))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads the optional TOML file, then layers environment variables on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| env::var(key).ok()))
    }

    /// Applies `SALESFLOW_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SALESFLOW_INPUT") {
            self.input_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("SALESFLOW_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SALESFLOW_TABLE") {
            self.table_name = value;
        }
        if let Some(value) = lookup("SALESFLOW_LOG_DIR") {
            self.log_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SALESFLOW_MEASURE_MARKER") {
            self.measure_marker = value;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_column.trim().is_empty() {
            return Err(PipelineError::Config("key_column must not be empty".into()));
        }
        if self.measure_marker.is_empty() {
            return Err(PipelineError::Config(
                "measure_marker must not be empty".into(),
            ));
        }
        if self.table_name.trim().is_empty() {
            return Err(PipelineError::Config("table_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn totals_path(&self) -> PathBuf {
        self.output_dir.join(&self.totals_file)
    }

    pub fn growth_path(&self) -> PathBuf {
        self.output_dir.join(&self.growth_file)
    }

    pub fn database_path(&self) -> PathBuf {
        self.output_dir.join(&self.database_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(DEFAULT_LOG_FILE)
    }
}
