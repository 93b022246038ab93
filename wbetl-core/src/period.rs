//! Calendar groupings derived from the observation year.
//!
//! `decade(y)` is `y - (y mod 10)`. Period buckets are configured as
//! decade-aligned half-open year ranges, so every year of a decade lands in the
//! same bucket and `period` can never disagree with `decade`. Years outside all
//! configured buckets fall back to the decade label (`"2010s"`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Start year of the decade containing `year`.
pub fn decade(year: i32) -> i32 {
    year - year.rem_euclid(10)
}

/// Default label for a decade, e.g. `2010s`.
pub fn decade_label(year: i32) -> String {
    format!("{}s", decade(year))
}

#[derive(Debug, Error, PartialEq)]
pub enum PeriodError {
    #[error("period bucket '{label}' is not decade-aligned ({start}..{end})")]
    Misaligned { label: String, start: i32, end: i32 },

    #[error("period bucket '{label}' is empty ({start}..{end})")]
    Empty { label: String, start: i32, end: i32 },

    #[error("period buckets '{first}' and '{second}' overlap")]
    Overlap { first: String, second: String },

    #[error("period bucket label must not be blank")]
    BlankLabel,
}

/// A named range of years `[start, end)`. Both bounds are multiples of ten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub start: i32,
    pub end: i32,
    pub label: String,
}

impl PeriodBucket {
    pub fn new(start: i32, end: i32, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    fn contains(&self, year: i32) -> bool {
        year >= self.start && year < self.end
    }
}

/// Validated, sorted, non-overlapping set of period buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PeriodBucket>", into = "Vec<PeriodBucket>")]
pub struct PeriodBuckets {
    buckets: Vec<PeriodBucket>,
}

impl PeriodBuckets {
    pub fn new(mut buckets: Vec<PeriodBucket>) -> Result<Self, PeriodError> {
        for b in &buckets {
            if b.label.trim().is_empty() {
                return Err(PeriodError::BlankLabel);
            }
            if b.start.rem_euclid(10) != 0 || b.end.rem_euclid(10) != 0 {
                return Err(PeriodError::Misaligned {
                    label: b.label.clone(),
                    start: b.start,
                    end: b.end,
                });
            }
            if b.start >= b.end {
                return Err(PeriodError::Empty {
                    label: b.label.clone(),
                    start: b.start,
                    end: b.end,
                });
            }
        }

        buckets.sort_by_key(|b| b.start);
        for pair in buckets.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(PeriodError::Overlap {
                    first: pair[0].label.clone(),
                    second: pair[1].label.clone(),
                });
            }
        }

        Ok(Self { buckets })
    }

    /// No explicit buckets: every decade is its own period.
    pub fn decade_labels() -> Self {
        Self::default()
    }

    pub fn buckets(&self) -> &[PeriodBucket] {
        &self.buckets
    }

    /// Period label for `year`.
    pub fn period(&self, year: i32) -> String {
        self.buckets
            .iter()
            .find(|b| b.contains(year))
            .map(|b| b.label.clone())
            .unwrap_or_else(|| decade_label(year))
    }
}

impl TryFrom<Vec<PeriodBucket>> for PeriodBuckets {
    type Error = PeriodError;

    fn try_from(buckets: Vec<PeriodBucket>) -> Result<Self, Self::Error> {
        Self::new(buckets)
    }
}

impl From<PeriodBuckets> for Vec<PeriodBucket> {
    fn from(periods: PeriodBuckets) -> Self {
        periods.buckets
    }
}
