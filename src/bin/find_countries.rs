// List the distinct region codes in a raw extract.
//
// Used to keep the `Region` catalog in step with the dataset: codes the
// catalog does not know are reported as warnings.

use anyhow::{Context, Result};
use clap::Parser;
use life_expectancy::{clean, distinct_regions, load_source, Region, SourceFormat};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Write the distinct regions found in a raw extract")]
struct Args {
    /// Raw extract to scan
    #[arg(long, default_value = "data/eu_life_expectancy_raw.tsv")]
    input: PathBuf,
    /// Raw source format; inferred from the input extension when omitted
    #[arg(long, value_enum)]
    source: Option<SourceFormat>,
    /// CSV to write, one `region_country` per row
    #[arg(long, default_value = "tests/fixtures/distinct_countries.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    let source = args
        .source
        .unwrap_or_else(|| SourceFormat::from_path(&args.input));

    let raw = load_source(&args.input, source)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let cleaned = clean(&raw, source.layout())?;
    let regions = distinct_regions(&cleaned)?;

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record(["region_country"])?;
    for code in &regions {
        if code.parse::<Region>().is_err() {
            warn!(code = %code, "region missing from catalog");
        }
        writer.write_record([code])?;
    }
    writer.flush()?;

    info!(
        regions = regions.len(),
        output = %args.output.display(),
        "wrote distinct regions"
    );
    Ok(())
}
