//! Serializable pipeline configuration.
//!
//! Every section has defaults, so an empty TOML document (or no file at all)
//! yields a runnable configuration: the default catalog, 2010–2023, and a
//! DuckDB file in the working directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use wbetl_core::data::ClientConfig;
use wbetl_core::{Catalog, CatalogError, PeriodBuckets, SummaryIndicators, YearWindow};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Decade-aligned period buckets; empty means one period per decade.
    pub periods: PeriodBuckets,
    pub extract: ExtractConfig,
    pub store: StoreConfig,
    pub summary: SummaryIndicators,
    pub catalog: Catalog,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            periods: PeriodBuckets::decade_labels(),
            extract: ExtractConfig::default(),
            store: StoreConfig::default(),
            summary: SummaryIndicators::default(),
            catalog: Catalog::default_world_bank(),
        }
    }
}

/// Upstream request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub base_url: String,
    /// First year requested (inclusive).
    pub start_year: i32,
    /// Last year requested (inclusive).
    pub end_year: i32,
    pub per_page: u32,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Minimum spacing between consecutive requests.
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".into(),
            start_year: 2010,
            end_year: 2023,
            per_page: 500,
            max_retries: 3,
            retry_delay_ms: 1000,
            request_delay_ms: 500,
            timeout_secs: 10,
        }
    }
}

impl ExtractConfig {
    pub fn window(&self) -> YearWindow {
        YearWindow::new(self.start_year, self.end_year)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            per_page: self.per_page,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            request_delay: Duration::from_millis(self.request_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Relational store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// DuckDB database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("worldbank_etl.duckdb"),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.extract;
        if e.start_year > e.end_year {
            return Err(ConfigError::Invalid(format!(
                "start_year {} is after end_year {}",
                e.start_year, e.end_year
            )));
        }
        if e.per_page == 0 {
            return Err(ConfigError::Invalid("per_page must be positive".into()));
        }
        if e.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        self.catalog.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.extract.window(), YearWindow::new(2010, 2023));
        assert_eq!(config.catalog.pair_count(), 56);
    }

    #[test]
    fn toml_roundtrip() {
        let config = PipelineConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml_str = r#"
[extract]
start_year = 2000
request_delay_ms = 0

[store]
path = "/tmp/indicators.duckdb"

[[periods]]
start = 2000
end = 2020
label = "pre-2020"
"#;
        let config = PipelineConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.extract.start_year, 2000);
        assert_eq!(config.extract.end_year, 2023);
        assert_eq!(config.extract.max_retries, 3);
        assert_eq!(config.store.path, PathBuf::from("/tmp/indicators.duckdb"));
        assert_eq!(config.periods.period(2015), "pre-2020");
        assert_eq!(config.periods.period(2021), "2020s");
        assert_eq!(
            config.extract.client_config().request_delay,
            Duration::ZERO
        );
    }

    #[test]
    fn rejects_inverted_window() {
        let err = PipelineConfig::from_toml("[extract]\nstart_year = 2024\nend_year = 2020\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_misaligned_periods() {
        let toml_str = r#"
[[periods]]
start = 2010
end = 2015
label = "2010-2015"
"#;
        assert!(matches!(
            PipelineConfig::from_toml(toml_str),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn custom_catalog_replaces_default() {
        let toml_str = r#"
[catalog.countries.FRA]
name = "France"
continent = "Europe"

[catalog.indicators]
"SP.POP.TOTL" = "Population, total"
"#;
        let config = PipelineConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.catalog.pair_count(), 1);
        assert_eq!(config.catalog.pairs(), vec![("FRA", "SP.POP.TOTL")]);
    }
}
