//! wbetl core — domain types, upstream client, and the pure pipeline stages.
//!
//! This crate contains everything that does not touch the relational store:
//! - Domain types (raw observations, fact rows, derived rows)
//! - Static country/indicator catalog
//! - Decade and period bucket derivation
//! - World Bank API client with pagination and fixed-delay retries
//! - Extractor over the country × indicator cross-product
//! - Transformer (join, clean, dedupe, derive)
//! - Aggregator (latest values, year-over-year changes, country summaries)

pub mod aggregate;
pub mod catalog;
pub mod data;
pub mod domain;
pub mod period;
pub mod transform;

pub use aggregate::{latest, summary, yoy, SummaryIndicators};
pub use catalog::{Catalog, CatalogError, CountryInfo};
pub use domain::{
    CountrySummary, IndicatorRecord, LatestIndicator, ObservedValue, RawObservation, YearWindow,
    YoyChange,
};
pub use period::{decade, PeriodBucket, PeriodBuckets, PeriodError};
pub use transform::{TransformOutput, TransformReport, Transformer};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline data crosses no thread-affine types.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<RawObservation>();
        require_sync::<RawObservation>();
        require_send::<IndicatorRecord>();
        require_sync::<IndicatorRecord>();
        require_send::<LatestIndicator>();
        require_sync::<LatestIndicator>();
        require_send::<YoyChange>();
        require_sync::<YoyChange>();
        require_send::<CountrySummary>();
        require_sync::<CountrySummary>();
        require_send::<Catalog>();
        require_sync::<Catalog>();
        require_send::<PeriodBuckets>();
        require_sync::<PeriodBuckets>();
        require_send::<data::WorldBankClient>();
        require_sync::<data::WorldBankClient>();
    }

    /// Architecture contract: providers only see codes and a year window,
    /// never the catalog or the store.
    #[test]
    fn provider_trait_takes_codes_only() {
        fn _check_trait_object_builds(
            provider: &dyn data::IndicatorProvider,
            window: YearWindow,
        ) -> Result<Vec<RawObservation>, data::DataError> {
            provider.fetch("IND", "NY.GDP.MKTP.CD", window)
        }
    }
}
