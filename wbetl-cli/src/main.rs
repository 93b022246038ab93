//! wbetl CLI — run the indicators ETL once and print the run report.
//!
//! With no arguments, runs the built-in catalog over 2010–2023 into
//! `./worldbank_etl.duckdb`. Exits non-zero only on a run-level failure;
//! individual pairs or tables failing still exit 0.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wbetl_core::data::{LogProgress, WorldBankClient};
use wbetl_runner::{run_pipeline, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "wbetl",
    about = "World Bank economic indicators ETL: extract, transform, load into DuckDB"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to the built-in config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// DuckDB database file (overrides [store].path).
    #[arg(long)]
    db: Option<PathBuf>,

    /// First year to extract (overrides [extract].start_year).
    #[arg(long)]
    start_year: Option<i32>,

    /// Last year to extract (overrides [extract].end_year).
    #[arg(long)]
    end_year: Option<i32>,

    /// Print the run report as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the default config as TOML and exit.
    #[arg(long, default_value_t = false)]
    print_default_config: bool,
}

impl Cli {
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(y) = self.start_year {
            config.extract.start_year = y;
        }
        if let Some(y) = self.end_year {
            config.extract.end_year = y;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", PipelineConfig::default().to_toml()?);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.load_config()?;
    let client = WorldBankClient::new(config.extract.client_config())
        .context("building World Bank client")?;

    let report = run_pipeline(&config, &client, &LogProgress).context("ETL run failed")?;
    info!("Store: {}", config.store.path.display());

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_is_a_full_default_run() {
        let cli = Cli::try_parse_from(["wbetl"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "wbetl",
            "--db",
            "/tmp/x.duckdb",
            "--start-year",
            "2015",
            "--end-year",
            "2020",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/x.duckdb"));
        assert_eq!(config.extract.start_year, 2015);
        assert_eq!(config.extract.end_year, 2020);
    }

    #[test]
    fn inverted_years_are_rejected() {
        let cli = Cli::try_parse_from(["wbetl", "--start-year", "2024", "--end-year", "2020"])
            .unwrap();
        assert!(cli.load_config().is_err());
    }
}
