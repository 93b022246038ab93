//! Fact rows and the three derived views.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Normalized fact row. Natural key: (country_code, indicator_code, year).
///
/// `decade` and `period` are pure functions of `year`; the transformer is the
/// only place that sets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub country_code: String,
    pub country_name: String,
    pub indicator_code: String,
    pub indicator_name: String,
    pub year: i32,
    pub value: Option<f64>,
    pub decade: i32,
    pub period: String,
    pub continent: String,
    pub extracted_at: NaiveDateTime,
    /// Set by the store when the row is persisted.
    pub loaded_at: Option<NaiveDateTime>,
}

impl IndicatorRecord {
    pub fn series_key(&self) -> (&str, &str) {
        (&self.country_code, &self.indicator_code)
    }
}

/// The most recent non-null record of one (country, indicator) series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestIndicator {
    #[serde(flatten)]
    pub record: IndicatorRecord,
}

/// Percent change between two consecutive years of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoyChange {
    pub country_code: String,
    pub indicator_code: String,
    pub year: i32,
    pub value_prev: f64,
    pub value_curr: f64,
    pub pct_change: f64,
}

/// Per-country headline figures. Missing indicators leave a field empty
/// rather than dropping the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub country_code: String,
    pub country_name: String,
    pub total_indicators: usize,
    pub latest_gdp: Option<f64>,
    pub latest_population: Option<f64>,
    pub avg_gdp_growth: Option<f64>,
}
