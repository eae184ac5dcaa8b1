use anyhow::{Context, Result};
use clap::Parser;
use life_expectancy::{pipeline, PipelineConfig, Region, SourceFormat};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Clean the Eurostat life-expectancy extract down to one region"
)]
struct Args {
    /// Region code to keep, e.g. PT, DE or EU27_2020 [default: PT]
    #[arg(long)]
    region: Option<String>,
    /// Raw source format; inferred from the input extension when omitted
    #[arg(long, value_enum)]
    source: Option<SourceFormat>,
    /// Raw extract to read
    #[arg(long)]
    input: Option<PathBuf>,
    /// Where to write the cleaned CSV
    #[arg(long)]
    output: Option<PathBuf>,
    /// Directory for default input and output paths [default: data]
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// YAML file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        self.into_config_with(|key| env::var(key).ok())
    }

    /// Layers defaults, the YAML file, `lookup` for environment variables and
    /// then the command line, later layers winning.
    fn into_config_with(
        self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<PipelineConfig> {
        let base = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        let mut config = base.with_overrides_from(lookup)?;

        if let Some(code) = &self.region {
            config.region = code.parse::<Region>()?;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(source) = self
            .source
            .or_else(|| self.input.as_deref().map(SourceFormat::from_path))
        {
            config.source = source;
        }
        if self.input.is_some() {
            config.input = self.input;
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = Args::parse().into_config()?;
    info!(?config, "startup");

    let table = pipeline::run(&config)
        .with_context(|| format!("cleaning {}", config.input_path().display()))?;

    info!(
        rows = table.num_rows(),
        output = %config.output_path().display(),
        "all done"
    );
    Ok(())
}
