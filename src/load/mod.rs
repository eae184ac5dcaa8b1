// src/load/mod.rs
use serde::Deserialize;
use std::{fs::File, path::Path};
use tracing::info;

use crate::error::{PipelineError, Result};

pub mod tsv;
pub mod zip_json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Column names in source order.
    pub headers: Vec<String>,
    /// Each data row, one String per header.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// How the observations are laid out in a `RawTable`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Composite key column followed by one column per year.
    Wide,
    /// One record per observation-year.
    Long,
}

/// The two supported raw source encodings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Tab-separated text in the wide layout.
    #[default]
    Tsv,
    /// Zip archive holding a JSON array of long-layout records.
    Zip,
}

impl SourceFormat {
    /// `.zip` files are archives, anything else is read as TSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zip") => SourceFormat::Zip,
            _ => SourceFormat::Tsv,
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            SourceFormat::Tsv => Layout::Wide,
            SourceFormat::Zip => Layout::Long,
        }
    }

    /// File name of the raw extract inside the data directory.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceFormat::Tsv => "eu_life_expectancy_raw.tsv",
            SourceFormat::Zip => "eurostat_life_expect.zip",
        }
    }

    /// Parse an already opened source.
    pub fn read(&self, file: File) -> Result<RawTable> {
        match self {
            SourceFormat::Tsv => tsv::read_tsv(file),
            SourceFormat::Zip => zip_json::read_zipped_json(file),
        }
    }
}

/// Open `path` and decode it with `format`. The handle is released on return.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_source<P: AsRef<Path>>(path: P, format: SourceFormat) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::from_open(e, path))?;
    let table = format.read(file)?;
    info!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        ?format,
        "loaded raw table"
    );
    Ok(table)
}
