//! Domain types for the indicator pipeline

pub mod observation;
pub mod record;

pub use observation::{ObservedValue, RawObservation, YearWindow};
pub use record::{CountrySummary, IndicatorRecord, LatestIndicator, YoyChange};

/// ISO 3166-1 alpha-3 country code, e.g. `IND`.
pub type CountryCode = String;

/// World Bank indicator code, e.g. `NY.GDP.MKTP.CD`.
pub type IndicatorCode = String;
