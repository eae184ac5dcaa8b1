use arrow::{
    array::{BooleanArray, StringArray},
    compute::filter_record_batch,
    record_batch::RecordBatch,
};
use std::collections::HashSet;
use tracing::info;

use crate::clean::REGION;
use crate::error::{PipelineError, Result};
use crate::region::Region;

fn region_column(batch: &RecordBatch) -> Result<&StringArray> {
    batch
        .column_by_name(REGION)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| PipelineError::parse(format!("table has no string `{}` column", REGION)))
}

/// Keep the rows observed for `region`, in their original order.
///
/// A catalogued region with no rows gives an empty table.
pub fn filter_region(batch: &RecordBatch, region: Region) -> Result<RecordBatch> {
    let code = region.as_str();
    let mask: BooleanArray = region_column(batch)?
        .iter()
        .map(|v| Some(v == Some(code)))
        .collect();
    let filtered = filter_record_batch(batch, &mask)?;
    info!(
        region = code,
        kept = filtered.num_rows(),
        total = batch.num_rows(),
        "filtered by region"
    );
    Ok(filtered)
}

/// Like [`filter_region`], validating a free-form code against the catalog
/// first.
pub fn filter_region_code(batch: &RecordBatch, code: &str) -> Result<RecordBatch> {
    let region: Region = code.parse()?;
    filter_region(batch, region)
}

/// Distinct region codes in first-seen order, then stably sorted by code
/// length so countries list before aggregates.
pub fn distinct_regions(batch: &RecordBatch) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut codes: Vec<String> = region_column(batch)?
        .iter()
        .flatten()
        .filter(|code| seen.insert(*code))
        .map(str::to_string)
        .collect();
    codes.sort_by_key(|c| c.len());
    Ok(codes)
}
