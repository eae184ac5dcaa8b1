// src/clean/mod.rs
use arrow::{
    array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::load::{Layout, RawTable};

pub mod utils;

use utils::{normalize_value, normalize_year, split_composite};

pub const UNIT: &str = "unit";
pub const SEX: &str = "sex";
pub const AGE: &str = "age";
pub const REGION: &str = "region";
pub const YEAR: &str = "year";
pub const VALUE: &str = "value";

/// Long-layout source columns and what they become.
const LONG_COUNTRY: &str = "country";
const LONG_VALUE: &str = "life_expectancy";
const LONG_FLAGS: [&str; 2] = ["flag", "flag_detail"];

/// Schema of every cleaned table: `unit,sex,age,region,year,value`.
pub fn observation_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(UNIT, DataType::Utf8, false),
        Field::new(SEX, DataType::Utf8, false),
        Field::new(AGE, DataType::Utf8, false),
        Field::new(REGION, DataType::Utf8, false),
        Field::new(YEAR, DataType::Int64, false),
        Field::new(VALUE, DataType::Float64, false),
    ]))
}

/// Clean `raw` according to how its observations are laid out.
pub fn clean(raw: &RawTable, layout: Layout) -> Result<RecordBatch> {
    match layout {
        Layout::Wide => clean_wide(raw),
        Layout::Long => clean_long(raw),
    }
}

/// Accumulates observation columns; rows without a usable value are counted
/// and skipped.
struct ObservationBuilder {
    unit: StringBuilder,
    sex: StringBuilder,
    age: StringBuilder,
    region: StringBuilder,
    year: Int64Builder,
    value: Float64Builder,
    dropped: usize,
}

impl ObservationBuilder {
    fn with_capacity(rows: usize) -> Self {
        Self {
            unit: StringBuilder::with_capacity(rows, rows * 2),
            sex: StringBuilder::with_capacity(rows, rows),
            age: StringBuilder::with_capacity(rows, rows * 4),
            region: StringBuilder::with_capacity(rows, rows * 2),
            year: Int64Builder::with_capacity(rows),
            value: Float64Builder::with_capacity(rows),
            dropped: 0,
        }
    }

    fn append(&mut self, dims: [&str; 4], year: i64, value: Option<f64>) {
        let Some(value) = value else {
            self.dropped += 1;
            return;
        };
        let [unit, sex, age, region] = dims;
        self.unit.append_value(unit);
        self.sex.append_value(sex);
        self.age.append_value(age);
        self.region.append_value(region);
        self.year.append_value(year);
        self.value.append_value(value);
    }

    fn finish(mut self) -> Result<(RecordBatch, usize)> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.unit.finish()),
            Arc::new(self.sex.finish()),
            Arc::new(self.age.finish()),
            Arc::new(self.region.finish()),
            Arc::new(self.year.finish()),
            Arc::new(self.value.finish()),
        ];
        let batch = RecordBatch::try_new(observation_schema(), columns)?;
        Ok((batch, self.dropped))
    }
}

fn check_widths(raw: &RawTable) -> Result<()> {
    for (idx, row) in raw.rows.iter().enumerate() {
        if row.len() != raw.headers.len() {
            return Err(PipelineError::parse(format!(
                "row {} has {} cells, header has {}",
                idx,
                row.len(),
                raw.headers.len()
            )));
        }
    }
    Ok(())
}

/// Reshape the wide extract (composite key + one column per year) into one
/// row per key and year.
///
/// Output is column-major: every row for the first year column, then every
/// row for the next. Cells whose value is missing or not numeric are dropped.
pub fn clean_wide(raw: &RawTable) -> Result<RecordBatch> {
    let (key_header, year_headers) = raw
        .headers
        .split_first()
        .ok_or_else(|| PipelineError::parse("wide table has no columns"))?;
    check_widths(raw)?;

    let years: Vec<i64> = year_headers
        .iter()
        .map(|h| normalize_year(h))
        .collect::<Result<_>>()?;

    let keys: Vec<[String; 4]> = raw
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            split_composite(&row[0])
                .map_err(|e| e.located(format_args!("`{}` column, row {}", key_header, idx)))
        })
        .collect::<Result<_>>()?;

    let mut builder = ObservationBuilder::with_capacity(raw.rows.len() * years.len());
    for (col, year) in years.iter().enumerate() {
        for (key, row) in keys.iter().zip(&raw.rows) {
            let cell = &row[col + 1];
            let value = normalize_value(cell);
            if value.is_none() {
                debug!(key = %key.join(","), year, cell = %cell, "dropping missing value");
            }
            builder.append(
                [key[0].as_str(), key[1].as_str(), key[2].as_str(), key[3].as_str()],
                *year,
                value,
            );
        }
    }

    let (batch, dropped) = builder.finish()?;
    info!(rows = batch.num_rows(), dropped, years = years.len(), "cleaned wide table");
    Ok(batch)
}

/// Clean records that are already one per observation-year.
///
/// `country` becomes `region`, `life_expectancy` becomes `value` and the flag
/// columns are discarded. Years and values go through the same normalization
/// as the wide layout.
pub fn clean_long(raw: &RawTable) -> Result<RecordBatch> {
    let column = |name: &str| {
        raw.column_index(name)
            .ok_or_else(|| PipelineError::parse(format!("long table has no `{}` column", name)))
    };
    let unit = column(UNIT)?;
    let sex = column(SEX)?;
    let age = column(AGE)?;
    let region = column(LONG_COUNTRY)?;
    let year = column(YEAR)?;
    let value = column(LONG_VALUE)?;
    check_widths(raw)?;

    let used = [UNIT, SEX, AGE, LONG_COUNTRY, YEAR, LONG_VALUE];
    let ignored: Vec<&String> = raw
        .headers
        .iter()
        .filter(|h| !used.contains(&h.as_str()) && !LONG_FLAGS.contains(&h.as_str()))
        .collect();
    if !ignored.is_empty() {
        debug!(?ignored, "ignoring extra long-table columns");
    }

    let mut builder = ObservationBuilder::with_capacity(raw.rows.len());
    for (idx, row) in raw.rows.iter().enumerate() {
        let parsed_year =
            normalize_year(&row[year]).map_err(|e| e.located(format_args!("row {}", idx)))?;
        let parsed_value = parse_long_value(&row[value]);
        if parsed_value.is_none() {
            debug!(row = idx, cell = %row[value], "dropping missing value");
        }
        builder.append(
            [
                row[unit].as_str(),
                row[sex].as_str(),
                row[age].as_str(),
                row[region].as_str(),
            ],
            parsed_year,
            parsed_value,
        );
    }

    let (batch, dropped) = builder.finish()?;
    info!(rows = batch.num_rows(), dropped, "cleaned long table");
    Ok(batch)
}

/// Long-layout values are usually plain JSON numbers; anything else falls back
/// to annotation stripping.
fn parse_long_value(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .or_else(|| normalize_value(cell))
}
