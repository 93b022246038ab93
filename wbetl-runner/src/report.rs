//! End-of-run report.

use crate::store::{LoadSummary, TableLoad};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use wbetl_core::data::ExtractSummary;
use wbetl_core::TransformReport;

/// Structured summary of one pipeline run.
///
/// A run that returns a `RunReport` completed all four phases; per-pair
/// and per-table failures are counted here rather than propagated.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: NaiveDateTime,
    pub elapsed_secs: f64,
    pub extract: ExtractSummary,
    pub records_extracted: usize,
    pub transform: TransformReport,
    pub records_cleaned: usize,
    pub latest_rows: usize,
    pub yoy_rows: usize,
    pub summary_rows: usize,
    pub load: LoadSummary,
    pub records_loaded: usize,
}

impl RunReport {
    /// Every pair fetched and every table committed.
    pub fn is_clean(&self) -> bool {
        self.extract.all_succeeded() && self.load.failed_tables().is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, t: &TableLoad) -> fmt::Result {
    match &t.error {
        None => writeln!(
            f,
            "  {:<20} {:>6} rows  {:>6} inserted  {:>6} updated  {:>6} stale removed",
            t.table, t.rows, t.inserted, t.updated, t.removed
        ),
        Some(e) => writeln!(f, "  {:<20} FAILED (rolled back): {e}", t.table),
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.transform;
        writeln!(f, "ETL run started {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(
            f,
            "Pairs: {} attempted, {} succeeded, {} failed",
            self.extract.attempted, self.extract.succeeded, self.extract.failed
        )?;
        for p in &self.extract.failures {
            writeln!(f, "  {} / {}: {}", p.country_code, p.indicator_code, p.reason)?;
        }
        writeln!(f, "Records extracted:     {}", self.records_extracted)?;
        writeln!(f, "Records after cleaning: {}", self.records_cleaned)?;
        writeln!(
            f,
            "  dropped: {} null, {} unparseable, {} out of range, {} unknown country, {} unknown indicator, {} out of window; {} duplicates",
            t.null_values,
            t.unparseable_values,
            t.out_of_range,
            t.unknown_country,
            t.unknown_indicator,
            t.out_of_window,
            t.duplicates_removed
        )?;
        writeln!(
            f,
            "Derived rows: {} latest, {} yoy, {} summary",
            self.latest_rows, self.yoy_rows, self.summary_rows
        )?;
        writeln!(f, "Records loaded:        {}", self.records_loaded)?;
        for table in &self.load.tables {
            write_table(f, table)?;
        }
        write!(f, "Elapsed: {:.2}s", self.elapsed_secs)
    }
}
