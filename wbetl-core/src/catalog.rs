//! Catalog configuration — the countries and indicators a run covers.
//!
//! Countries map an ISO3 code to a display name and continent; indicators map
//! a World Bank code to a display name. Both are ordinary immutable maps passed
//! into the pipeline. `BTreeMap` keeps the cross-product order stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no countries")]
    NoCountries,

    #[error("catalog has no indicators")]
    NoIndicators,
}

/// Static metadata for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub name: String,
    pub continent: String,
}

impl CountryInfo {
    pub fn new(name: impl Into<String>, continent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            continent: continent.into(),
        }
    }
}

/// The complete country/indicator catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub countries: BTreeMap<String, CountryInfo>,
    pub indicators: BTreeMap<String, String>,
}

impl Catalog {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.countries.is_empty() {
            return Err(CatalogError::NoCountries);
        }
        if self.indicators.is_empty() {
            return Err(CatalogError::NoIndicators);
        }
        Ok(())
    }

    pub fn country(&self, code: &str) -> Option<&CountryInfo> {
        self.countries.get(code)
    }

    pub fn indicator(&self, code: &str) -> Option<&str> {
        self.indicators.get(code).map(|s| s.as_str())
    }

    /// Every (country_code, indicator_code) pair, countries outer, both sorted.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.countries
            .keys()
            .flat_map(|c| self.indicators.keys().map(move |i| (c.as_str(), i.as_str())))
            .collect()
    }

    pub fn pair_count(&self) -> usize {
        self.countries.len() * self.indicators.len()
    }

    /// Seven large economies and eight headline World Bank indicators.
    pub fn default_world_bank() -> Self {
        let countries = [
            ("IND", "India", "Asia"),
            ("USA", "United States", "North America"),
            ("CHN", "China", "Asia"),
            ("GBR", "United Kingdom", "Europe"),
            ("JPN", "Japan", "Asia"),
            ("DEU", "Germany", "Europe"),
            ("BRA", "Brazil", "South America"),
        ]
        .into_iter()
        .map(|(code, name, continent)| (code.to_string(), CountryInfo::new(name, continent)))
        .collect();

        let indicators = [
            ("NY.GDP.MKTP.CD", "GDP (current US$)"),
            ("NY.GDP.PCAP.CD", "GDP per capita (current US$)"),
            ("NY.GDP.MKTP.KD.ZG", "GDP growth (annual %)"),
            ("SP.POP.TOTL", "Population, total"),
            ("FP.CPI.TOTL.ZG", "Inflation, consumer prices (annual %)"),
            ("SL.UEM.TOTL.ZS", "Unemployment, total (% of labor force)"),
            ("NE.EXP.GNFS.ZS", "Exports of goods and services (% of GDP)"),
            ("NE.IMP.GNFS.ZS", "Imports of goods and services (% of GDP)"),
        ]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();

        Self {
            countries,
            indicators,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::default_world_bank()
    }
}
