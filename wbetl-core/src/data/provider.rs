//! Data provider trait and structured error types.
//!
//! The IndicatorProvider trait abstracts over the upstream source so the
//! extractor can be driven by a scripted provider in tests.

use crate::domain::{RawObservation, YearWindow};
use thiserror::Error;
use tracing::{info, warn};

/// Structured error types for upstream operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from upstream")]
    HttpStatus { status: u16, retryable: bool },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("upstream rejected request: {0}")]
    Api(String),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<DataError> },

    #[error("no observations returned")]
    Empty,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::NetworkUnreachable(_) | DataError::ResponseFormatChanged(_) => true,
            DataError::HttpStatus { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        let retryable = status == 408 || status == 429 || (500..600).contains(&status);
        DataError::HttpStatus { status, retryable }
    }
}

/// Trait for upstream indicator sources.
///
/// `fetch` returns every observation of one (country, indicator) series over
/// the window, following pagination. Retries happen inside the provider;
/// an `Err` means the pair is given up for this run.
pub trait IndicatorProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(
        &self,
        country_code: &str,
        indicator_code: &str,
        window: YearWindow,
    ) -> Result<Vec<RawObservation>, DataError>;
}

/// Progress callback for the extraction loop.
pub trait ExtractProgress {
    /// Called before a pair is fetched.
    fn on_start(&self, country: &str, indicator: &str, index: usize, total: usize);

    /// Called when a pair completes; `Ok` carries the observation count.
    fn on_complete(
        &self,
        country: &str,
        indicator: &str,
        index: usize,
        total: usize,
        result: Result<usize, &DataError>,
    );

    /// Called when every pair has been attempted.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that writes through `tracing`.
pub struct LogProgress;

impl ExtractProgress for LogProgress {
    fn on_start(&self, country: &str, indicator: &str, index: usize, total: usize) {
        info!("[{}/{}] Extracting {country} - {indicator}", index + 1, total);
    }

    fn on_complete(
        &self,
        country: &str,
        indicator: &str,
        _index: usize,
        _total: usize,
        result: Result<usize, &DataError>,
    ) {
        match result {
            Ok(n) => info!("  OK: {country} - {indicator} ({n} observations)"),
            Err(e) => warn!("  FAIL: {country} - {indicator}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        info!("Extraction complete: {succeeded}/{total} pairs succeeded, {failed} failed");
    }
}
