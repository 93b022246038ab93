//! Derived views over the cleaned fact rows.
//!
//! All three projections are pure and independent of each other. Output order
//! follows the natural key so repeated runs produce identical sequences.

use crate::domain::{CountrySummary, IndicatorRecord, LatestIndicator, YoyChange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Indicator codes feeding `CountrySummary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryIndicators {
    pub gdp: String,
    pub population: String,
    pub gdp_growth: String,
}

impl Default for SummaryIndicators {
    fn default() -> Self {
        Self {
            gdp: "NY.GDP.MKTP.CD".into(),
            population: "SP.POP.TOTL".into(),
            gdp_growth: "NY.GDP.MKTP.KD.ZG".into(),
        }
    }
}

/// Most recent non-null record per (country, indicator).
///
/// Ties on year keep the first record seen.
pub fn latest(records: &[IndicatorRecord]) -> Vec<LatestIndicator> {
    let mut best: BTreeMap<(&str, &str), &IndicatorRecord> = BTreeMap::new();

    for r in records.iter().filter(|r| r.value.is_some()) {
        best.entry(r.series_key())
            .and_modify(|current| {
                if r.year > current.year {
                    *current = r;
                }
            })
            .or_insert(r);
    }

    best.into_values()
        .map(|r| LatestIndicator { record: r.clone() })
        .collect()
}

/// Percent change for every year whose previous year is also present.
///
/// Pairs with a zero previous value are skipped; null values never enter.
pub fn yoy(records: &[IndicatorRecord]) -> Vec<YoyChange> {
    let mut series: BTreeMap<(&str, &str), BTreeMap<i32, f64>> = BTreeMap::new();
    for r in records {
        if let Some(v) = r.value {
            series
                .entry(r.series_key())
                .or_default()
                .entry(r.year)
                .or_insert(v);
        }
    }

    let mut out = Vec::new();
    for ((country, indicator), values) in &series {
        for (&year, &curr) in values {
            let Some(&prev) = values.get(&(year - 1)) else {
                continue;
            };
            if prev == 0.0 {
                continue;
            }
            out.push(YoyChange {
                country_code: country.to_string(),
                indicator_code: indicator.to_string(),
                year,
                value_prev: prev,
                value_curr: curr,
                pct_change: (curr - prev) / prev * 100.0,
            });
        }
    }
    out
}

#[derive(Default)]
struct CountryAcc<'a> {
    name: &'a str,
    indicators: BTreeSet<&'a str>,
    gdp: Option<(i32, f64)>,
    population: Option<(i32, f64)>,
    growth_sum: f64,
    growth_n: usize,
}

fn keep_latest(slot: &mut Option<(i32, f64)>, year: i32, value: f64) {
    match slot {
        Some((y, _)) if *y >= year => {}
        _ => *slot = Some((year, value)),
    }
}

/// One row per country present in `records`.
pub fn summary(records: &[IndicatorRecord], codes: &SummaryIndicators) -> Vec<CountrySummary> {
    let mut countries: BTreeMap<&str, CountryAcc> = BTreeMap::new();

    for r in records {
        let acc = countries
            .entry(r.country_code.as_str())
            .or_insert_with(|| CountryAcc {
                name: &r.country_name,
                ..CountryAcc::default()
            });

        let Some(value) = r.value else {
            continue;
        };
        acc.indicators.insert(r.indicator_code.as_str());

        if r.indicator_code == codes.gdp {
            keep_latest(&mut acc.gdp, r.year, value);
        } else if r.indicator_code == codes.population {
            keep_latest(&mut acc.population, r.year, value);
        } else if r.indicator_code == codes.gdp_growth {
            acc.growth_sum += value;
            acc.growth_n += 1;
        }
    }

    countries
        .into_iter()
        .map(|(code, acc)| CountrySummary {
            country_code: code.to_string(),
            country_name: acc.name.to_string(),
            total_indicators: acc.indicators.len(),
            latest_gdp: acc.gdp.map(|(_, v)| v),
            latest_population: acc.population.map(|(_, v)| v),
            avg_gdp_growth: (acc.growth_n > 0).then(|| acc.growth_sum / acc.growth_n as f64),
        })
        .collect()
}
