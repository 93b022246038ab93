//! Extract → transform → aggregate against a scripted provider.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use wbetl_core::data::{extract, DataError, IndicatorProvider, LogProgress};
use wbetl_core::{
    latest, summary, yoy, Catalog, PeriodBuckets, RawObservation, SummaryIndicators, Transformer,
    YearWindow,
};

/// Returns canned series per (country, indicator); anything else fails.
struct ScriptedProvider {
    series: HashMap<(String, String), Vec<(i32, Option<f64>)>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            series: HashMap::new(),
        }
    }

    fn with(mut self, country: &str, indicator: &str, points: &[(i32, Option<f64>)]) -> Self {
        self.series
            .insert((country.into(), indicator.into()), points.to_vec());
        self
    }
}

impl IndicatorProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(
        &self,
        country_code: &str,
        indicator_code: &str,
        _window: YearWindow,
    ) -> Result<Vec<RawObservation>, DataError> {
        match self
            .series
            .get(&(country_code.to_string(), indicator_code.to_string()))
        {
            Some(points) => Ok(points
                .iter()
                .map(|&(year, v)| RawObservation::new(country_code, indicator_code, year, v))
                .collect()),
            None => Err(DataError::RetriesExhausted {
                attempts: 4,
                last: Box::new(DataError::NetworkUnreachable("connection refused".into())),
            }),
        }
    }
}

fn two_by_two() -> Catalog {
    let full = Catalog::default_world_bank();
    Catalog {
        countries: full
            .countries
            .into_iter()
            .filter(|(c, _)| c == "IND" || c == "USA")
            .collect(),
        indicators: full
            .indicators
            .into_iter()
            .filter(|(i, _)| i == "NY.GDP.MKTP.CD" || i == "SP.POP.TOTL")
            .collect(),
    }
}

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

#[test]
fn one_exhausted_pair_does_not_stop_the_rest() {
    let provider = ScriptedProvider::new()
        .with("IND", "NY.GDP.MKTP.CD", &[(2020, Some(2.8e12)), (2021, Some(3.2e12))])
        .with("IND", "SP.POP.TOTL", &[(2021, Some(1.4e9))])
        .with("USA", "SP.POP.TOTL", &[(2022, None), (2021, Some(3.3e8))]);
    // USA GDP is missing from the script and fails after retries

    let catalog = two_by_two();
    let window = YearWindow::new(2010, 2023);
    let out = extract(&provider, &catalog, window, &LogProgress);

    assert_eq!(out.summary.attempted, 4);
    assert_eq!(out.summary.failed, 1);
    assert_eq!(out.summary.succeeded, 3);
    assert_eq!(out.summary.failures[0].country_code, "USA");
    assert_eq!(out.summary.failures[0].indicator_code, "NY.GDP.MKTP.CD");
    assert_eq!(out.observations.len(), 5);

    let periods = PeriodBuckets::decade_labels();
    let transformed = Transformer::new(&catalog, &periods, window).transform(&out.observations, stamp());
    assert_eq!(transformed.report.null_values, 1);
    assert_eq!(transformed.records.len(), 4);
    assert!(transformed.records.iter().all(|r| r.extracted_at == stamp()));

    let changes = yoy(&transformed.records);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].country_code, "IND");
    assert!((changes[0].pct_change - 14.2857).abs() < 1e-3);

    let latest_rows = latest(&transformed.records);
    assert_eq!(latest_rows.len(), 3);

    let summaries = summary(&transformed.records, &SummaryIndicators::default());
    assert_eq!(summaries.len(), 2);
    let usa = summaries.iter().find(|s| s.country_code == "USA").unwrap();
    assert!(usa.latest_gdp.is_none());
    assert_eq!(usa.latest_population, Some(3.3e8));
    assert!(usa.avg_gdp_growth.is_none());
}
