use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::load::SourceFormat;
use crate::region::Region;

pub const ENV_DATA_DIR: &str = "LIFE_EXPECTANCY_DATA_DIR";
pub const ENV_REGION: &str = "LIFE_EXPECTANCY_REGION";

/// Settings for one pipeline run.
///
/// Layered as defaults → YAML file → environment → command line, each layer
/// overriding the previous one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the raw extract and the cleaned output.
    pub data_dir: PathBuf,
    pub source: SourceFormat,
    /// Raw extract; defaults to the format's usual name under `data_dir`.
    pub input: Option<PathBuf>,
    /// Cleaned CSV; defaults to `<region>_life_expectancy.csv` under `data_dir`.
    pub output: Option<PathBuf>,
    pub region: Region,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            source: SourceFormat::default(),
            input: None,
            output: None,
            region: Region::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PipelineError::from_open(e, path))?;
        Self::from_yaml_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `LIFE_EXPECTANCY_DATA_DIR` and `LIFE_EXPECTANCY_REGION` when
    /// `lookup` reports them set and non-empty. Pass `|k| std::env::var(k).ok()`
    /// for the process environment.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            debug!(data_dir = %dir, "data directory from environment");
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(code) = lookup(ENV_REGION).filter(|v| !v.is_empty()) {
            self.region = code.parse()?;
        }
        Ok(self)
    }

    pub fn input_path(&self) -> PathBuf {
        self.input
            .clone()
            .unwrap_or_else(|| self.data_dir.join(self.source.default_file_name()))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            self.data_dir.join(format!(
                "{}_life_expectancy.csv",
                self.region.as_str().to_lowercase()
            ))
        })
    }
}
