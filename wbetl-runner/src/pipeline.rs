//! One full ETL run: extract, transform, load facts, aggregate and load the
//! derived tables.
//!
//! Phases run strictly in order; each consumes the complete output of the
//! previous one. Aggregation reads the whole fact table back after this run's
//! facts are upserted, so the derived tables always match the stored facts,
//! including series whose pair failed this run. The store is opened after
//! transformation and is dropped when this function returns, whatever the
//! outcome.

use crate::config::{ConfigError, PipelineConfig};
use crate::report::RunReport;
use crate::store::{LoadSummary, Store, StoreError};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};
use wbetl_core::data::{extract, ExtractProgress, IndicatorProvider};
use wbetl_core::{latest, summary, yoy, Transformer};

/// Run-level failures. Per-pair and per-table failures are not errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("no observations extracted from {attempted} country/indicator pairs")]
    NothingExtracted { attempted: usize },
}

/// Current UTC time at the store's microsecond resolution.
fn now_stamp() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

fn banner(phase: &str) {
    info!("{}", "=".repeat(60));
    info!("{phase}");
    info!("{}", "=".repeat(60));
}

/// Execute the whole pipeline once against `provider`.
pub fn run_pipeline(
    config: &PipelineConfig,
    provider: &dyn IndicatorProvider,
    progress: &dyn ExtractProgress,
) -> Result<RunReport, PipelineError> {
    config.validate()?;
    let timer = Instant::now();
    let started_at = now_stamp();
    let window = config.extract.window();

    info!(
        "Starting ETL run: {} countries x {} indicators, {}-{}, source {}",
        config.catalog.countries.len(),
        config.catalog.indicators.len(),
        window.start,
        window.end,
        provider.name()
    );

    banner("PHASE 1: EXTRACTION");
    let extracted = extract(provider, &config.catalog, window, progress);
    let records_extracted = extracted.observations.len();
    if records_extracted == 0 {
        error!("No data extracted, aborting run");
        return Err(PipelineError::NothingExtracted {
            attempted: extracted.summary.attempted,
        });
    }
    if !extracted.summary.all_succeeded() {
        warn!(
            "{} of {} pairs failed",
            extracted.summary.failed, extracted.summary.attempted
        );
    }

    banner("PHASE 2: TRANSFORMATION");
    let transformed = Transformer::new(&config.catalog, &config.periods, window)
        .transform(&extracted.observations, started_at);
    let records = transformed.records;

    banner("PHASE 3: LOADING FACTS");
    let loaded_at = now_stamp();
    let mut store = Store::open(&config.store.path)?;
    store.ensure_schema()?;
    let fact_load = store.load_facts(&records, loaded_at);
    if !fact_load.committed() {
        warn!("Fact table rolled back; derived tables are rebuilt from its prior contents");
    }

    banner("PHASE 4: AGGREGATION");
    let facts = store.facts()?;
    let latest_rows = latest(&facts);
    let yoy_rows = yoy(&facts);
    let summary_rows = summary(&facts, &config.summary);
    info!(
        "Aggregation over {} stored facts: {} latest, {} yoy, {} country summaries",
        facts.len(),
        latest_rows.len(),
        yoy_rows.len(),
        summary_rows.len()
    );

    let mut tables = vec![fact_load];
    tables.extend(store.load_derived(&latest_rows, &yoy_rows, &summary_rows, loaded_at));
    drop(store);
    let load = LoadSummary {
        loaded_at: Some(loaded_at),
        tables,
    };
    for table in load.failed_tables() {
        warn!("Table {table} was not updated this run");
    }

    let report = RunReport {
        started_at,
        elapsed_secs: timer.elapsed().as_secs_f64(),
        records_extracted,
        records_cleaned: records.len(),
        latest_rows: latest_rows.len(),
        yoy_rows: yoy_rows.len(),
        summary_rows: summary_rows.len(),
        records_loaded: load.facts_loaded(),
        extract: extracted.summary,
        transform: transformed.report,
        load,
    };

    banner("ETL RUN COMPLETE");
    info!(
        "{} extracted, {} cleaned, {} loaded in {:.2}s",
        report.records_extracted, report.records_cleaned, report.records_loaded, report.elapsed_secs
    );
    Ok(report)
}
