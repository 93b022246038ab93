//! Upstream extraction: provider trait, World Bank client, and the extractor loop.

pub mod extract;
pub mod provider;
pub mod world_bank;

pub use extract::{extract, ExtractOutcome, ExtractSummary, PairFailure};
pub use provider::{DataError, ExtractProgress, IndicatorProvider, LogProgress};
pub use world_bank::{ClientConfig, Page, WorldBankClient};
