//! Extraction orchestrator — walks the country × indicator cross-product.

use super::provider::{DataError, ExtractProgress, IndicatorProvider};
use crate::catalog::Catalog;
use crate::domain::{RawObservation, YearWindow};
use serde::Serialize;

/// A pair that produced no observations this run.
#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    pub country_code: String,
    pub indicator_code: String,
    pub reason: String,
}

/// Counts for one extraction pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<PairFailure>,
}

impl ExtractSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug)]
pub struct ExtractOutcome {
    pub observations: Vec<RawObservation>,
    pub summary: ExtractSummary,
}

/// Fetch every catalog pair over `window`, in `Catalog::pairs` order.
///
/// A pair that errors or comes back empty is counted as failed and skipped.
/// Retrying is the provider's job; each pair is called exactly once here.
pub fn extract(
    provider: &dyn IndicatorProvider,
    catalog: &Catalog,
    window: YearWindow,
    progress: &dyn ExtractProgress,
) -> ExtractOutcome {
    let pairs = catalog.pairs();
    let total = pairs.len();
    let mut observations = Vec::new();
    let mut summary = ExtractSummary {
        attempted: total,
        ..ExtractSummary::default()
    };

    for (i, (country, indicator)) in pairs.into_iter().enumerate() {
        let country_label = catalog.country(country).map_or(country, |c| c.name.as_str());
        let indicator_label = catalog.indicator(indicator).unwrap_or(indicator);
        progress.on_start(country_label, indicator_label, i, total);

        let result = match provider.fetch(country, indicator, window) {
            Ok(batch) if batch.is_empty() => Err(DataError::Empty),
            Ok(batch) => Ok(batch),
            Err(e) => Err(e),
        };

        progress.on_complete(
            country_label,
            indicator_label,
            i,
            total,
            result.as_ref().map(|b| b.len()),
        );

        match result {
            Ok(batch) => {
                summary.succeeded += 1;
                observations.extend(batch);
            }
            Err(e) => {
                summary.failed += 1;
                summary.failures.push(PairFailure {
                    country_code: country.to_string(),
                    indicator_code: indicator.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    progress.on_batch_complete(summary.succeeded, summary.failed, total);

    ExtractOutcome {
        observations,
        summary,
    }
}
