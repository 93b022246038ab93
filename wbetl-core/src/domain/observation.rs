//! Raw observations as returned by an upstream provider.

use serde::{Deserialize, Serialize};

/// Inclusive range of calendar years requested from the upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Upstream `date` query parameter, e.g. `2010:2023`.
    pub fn as_query(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

/// Value cell of an observation before cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "raw", rename_all = "snake_case")]
pub enum ObservedValue {
    /// Upstream sent an explicit null or omitted the field.
    Missing,
    Number(f64),
    /// Upstream sent something that is not a finite number.
    Unparseable(String),
}

impl ObservedValue {
    /// The value if it is a usable finite number.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            ObservedValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ObservedValue::Missing)
    }
}

impl From<Option<f64>> for ObservedValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) => ObservedValue::Number(v),
            None => ObservedValue::Missing,
        }
    }
}

/// One (country, indicator, year) data point from the upstream source.
///
/// Held in memory only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub country_code: String,
    pub indicator_code: String,
    pub year: i32,
    pub value: ObservedValue,
    /// Display names echoed by the upstream source; the catalog stays authoritative.
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub indicator_name: Option<String>,
}

impl RawObservation {
    pub fn new(
        country_code: impl Into<String>,
        indicator_code: impl Into<String>,
        year: i32,
        value: impl Into<ObservedValue>,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            indicator_code: indicator_code.into(),
            year,
            value: value.into(),
            country_name: None,
            indicator_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_inclusive() {
        let w = YearWindow::new(2010, 2023);
        assert!(w.contains(2010));
        assert!(w.contains(2023));
        assert!(!w.contains(2009));
        assert!(!w.contains(2024));
        assert_eq!(w.as_query(), "2010:2023");
    }

    #[test]
    fn non_finite_numbers_are_not_usable() {
        assert_eq!(ObservedValue::Number(1.5).as_finite(), Some(1.5));
        assert_eq!(ObservedValue::Number(f64::NAN).as_finite(), None);
        assert_eq!(ObservedValue::Number(f64::INFINITY).as_finite(), None);
        assert_eq!(ObservedValue::Missing.as_finite(), None);
        assert_eq!(ObservedValue::Unparseable("n/a".into()).as_finite(), None);
    }

    #[test]
    fn option_converts_to_observed_value() {
        assert_eq!(ObservedValue::from(Some(2.0)), ObservedValue::Number(2.0));
        assert!(ObservedValue::from(None).is_missing());
    }
}
