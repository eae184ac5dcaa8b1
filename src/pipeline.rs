use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::info;

use crate::clean::clean;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::filter::filter_region;
use crate::load::load_source;
use crate::save::write_observations;

/// Load, clean, filter and write one extract, returning the written table.
///
/// The first failing stage aborts the run; the output file is only touched by
/// the final write.
#[tracing::instrument(level = "info", skip(config), fields(region = %config.region, source = ?config.source))]
pub fn run(config: &PipelineConfig) -> Result<RecordBatch> {
    let start = Instant::now();
    let input = config.input_path();
    let output = config.output_path();

    let raw = load_source(&input, config.source)?;
    let cleaned = clean(&raw, config.source.layout())?;
    let selected = filter_region(&cleaned, config.region)?;
    write_observations(&selected, &output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        rows = selected.num_rows(),
        elapsed = ?start.elapsed(),
        "pipeline finished"
    );
    Ok(selected)
}
