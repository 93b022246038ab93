//! Transformer — raw observations to normalized fact rows.
//!
//! Steps, in order:
//! 1. Join with catalog metadata; unknown country or indicator codes are dropped.
//! 2. Drop missing, unparseable and out-of-range values, and years outside the window.
//! 3. Deduplicate on (country, indicator, year), last extracted wins.
//! 4. Derive decade and period from year.
//! 5. Stamp every row with the run's single extraction timestamp.
//!
//! Every drop is counted in the `TransformReport`; nothing here errors.

use crate::catalog::Catalog;
use crate::domain::{IndicatorRecord, ObservedValue, RawObservation, YearWindow};
use crate::period::{decade, PeriodBuckets};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Per-category row counts for one transform pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    pub input_rows: usize,
    pub unknown_country: usize,
    pub unknown_indicator: usize,
    pub null_values: usize,
    pub unparseable_values: usize,
    /// Values too large for the store's `DECIMAL(20, 2)` columns.
    pub out_of_range: usize,
    pub out_of_window: usize,
    pub duplicates_removed: usize,
    pub output_rows: usize,
}

impl TransformReport {
    /// Rows dropped for any reason other than deduplication.
    pub fn dropped(&self) -> usize {
        self.unknown_country
            + self.unknown_indicator
            + self.null_values
            + self.unparseable_values
            + self.out_of_range
            + self.out_of_window
    }
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub records: Vec<IndicatorRecord>,
    pub report: TransformReport,
}

/// Fact rows are stored with two decimal places.
pub fn round_value(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Exclusive magnitude bound of a `DECIMAL(20, 2)` value.
pub const MAX_STORED_MAGNITUDE: f64 = 1e18;

pub fn fits_store(value: f64) -> bool {
    value.abs() < MAX_STORED_MAGNITUDE
}

pub struct Transformer<'a> {
    catalog: &'a Catalog,
    periods: &'a PeriodBuckets,
    window: YearWindow,
}

impl<'a> Transformer<'a> {
    pub fn new(catalog: &'a Catalog, periods: &'a PeriodBuckets, window: YearWindow) -> Self {
        Self {
            catalog,
            periods,
            window,
        }
    }

    /// Output is ordered by (country_code, indicator_code, year).
    pub fn transform(&self, raw: &[RawObservation], extracted_at: NaiveDateTime) -> TransformOutput {
        let mut report = TransformReport {
            input_rows: raw.len(),
            ..TransformReport::default()
        };
        let mut kept: BTreeMap<(&str, &str, i32), IndicatorRecord> = BTreeMap::new();

        for obs in raw {
            let Some(country) = self.catalog.country(&obs.country_code) else {
                report.unknown_country += 1;
                continue;
            };
            let Some(indicator_name) = self.catalog.indicator(&obs.indicator_code) else {
                report.unknown_indicator += 1;
                continue;
            };

            let value = match &obs.value {
                ObservedValue::Missing => {
                    report.null_values += 1;
                    continue;
                }
                v => match v.as_finite() {
                    Some(v) => round_value(v),
                    None => {
                        report.unparseable_values += 1;
                        continue;
                    }
                },
            };
            if !fits_store(value) {
                report.out_of_range += 1;
                continue;
            }

            if !self.window.contains(obs.year) {
                report.out_of_window += 1;
                continue;
            }

            let record = IndicatorRecord {
                country_code: obs.country_code.clone(),
                country_name: country.name.clone(),
                indicator_code: obs.indicator_code.clone(),
                indicator_name: indicator_name.to_string(),
                year: obs.year,
                value: Some(value),
                decade: decade(obs.year),
                period: self.periods.period(obs.year),
                continent: country.continent.clone(),
                extracted_at,
                loaded_at: None,
            };

            let key = (obs.country_code.as_str(), obs.indicator_code.as_str(), obs.year);
            if kept.insert(key, record).is_some() {
                report.duplicates_removed += 1;
            }
        }

        let records: Vec<IndicatorRecord> = kept.into_values().collect();
        report.output_rows = records.len();

        info!(
            "Transformation complete: {} in, {} out ({} dropped, {} duplicates)",
            report.input_rows,
            report.output_rows,
            report.dropped(),
            report.duplicates_removed
        );

        TransformOutput { records, report }
    }
}
