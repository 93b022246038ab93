//! wbetl runner — configuration, the DuckDB store, and pipeline orchestration.
//!
//! This crate builds on `wbetl-core` to provide:
//! - TOML pipeline configuration with defaults for every section
//! - DuckDB schema creation and per-table transactional upserts
//! - The four-phase run and its end-of-run report

pub mod config;
pub mod pipeline;
pub mod report;
pub mod store;

pub use config::{ConfigError, ExtractConfig, PipelineConfig, StoreConfig};
pub use pipeline::{run_pipeline, PipelineError};
pub use report::RunReport;
pub use store::{LoadSummary, Store, StoreError, TableLoad};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
        assert_send::<LoadSummary>();
        assert_sync::<LoadSummary>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn errors_are_send() {
        assert_send::<PipelineError>();
    }
}
