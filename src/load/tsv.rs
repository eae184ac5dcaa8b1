use csv::ReaderBuilder;
use std::io::Read;
use tracing::debug;

use super::RawTable;
use crate::error::{PipelineError, Result};

/// Read tab-separated text whose first line names the columns.
/// Every row must have exactly as many fields as the header.
pub fn read_tsv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::parse("TSV source has no header columns"));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
        if idx > 0 && idx % 10_000 == 0 {
            debug!(rows = idx, "reading TSV");
        }
    }

    Ok(RawTable { headers, rows })
}
