//! Batch cleaning of the Eurostat life-expectancy extract.
//!
//! A run loads the raw source (`load`), reshapes it into one row per
//! observation-year (`clean`), keeps a single region (`filter`) and writes the
//! result as CSV (`save`). `pipeline::run` wires the stages together.

pub mod clean;
pub mod config;
pub mod error;
pub mod filter;
pub mod load;
pub mod pipeline;
pub mod region;
pub mod save;

pub use clean::{clean, clean_long, clean_wide, observation_schema};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use filter::{distinct_regions, filter_region, filter_region_code};
pub use load::{load_source, Layout, RawTable, SourceFormat};
pub use pipeline::run;
pub use region::Region;
pub use save::{read_observations, write_observations};
