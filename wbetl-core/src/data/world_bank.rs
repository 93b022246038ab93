//! World Bank Indicators API (v2) provider.
//!
//! Fetches one country/indicator series per call from
//! `{base}/country/{country}/indicator/{indicator}?format=json&date=S:E`.
//! The API answers with a two-element array `[metadata, observations]`;
//! metadata carries `page` and `pages`, and the client walks every page.
//!
//! Each page request is retried a fixed number of times with a fixed delay.
//! Independently of retries, consecutive requests are spaced by
//! `request_delay` to stay under the upstream rate limit.

use super::provider::{DataError, IndicatorProvider};
use crate::domain::{ObservedValue, RawObservation, YearWindow};
use serde::{Deserialize, Deserializer};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client tuning knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub per_page: u32,
    /// Retries after the first attempt of each page request.
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Minimum spacing between any two requests.
    pub request_delay: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.worldbank.org/v2".into(),
            per_page: 500,
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
            request_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Pagination metadata (first array element).
///
/// Older API versions send the counters as strings.
#[derive(Debug, Deserialize)]
struct PageMeta {
    #[serde(deserialize_with = "lenient_u32")]
    page: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pages: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    indicator: Option<Named>,
    country: Option<Named>,
    date: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(u32),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// One decoded page of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page: u32,
    pub pages: u32,
    pub total: u32,
    pub observations: Vec<RawObservation>,
}

/// World Bank API provider.
pub struct WorldBankClient {
    client: reqwest::blocking::Client,
    config: ClientConfig,
    last_request: Mutex<Option<Instant>>,
}

impl WorldBankClient {
    pub fn new(config: ClientConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("wbetl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the request URL for one page of a series.
    pub fn page_url(
        &self,
        country_code: &str,
        indicator_code: &str,
        window: YearWindow,
        page: u32,
    ) -> String {
        format!(
            "{}/country/{country_code}/indicator/{indicator_code}\
             ?format=json&date={}&per_page={}&page={page}",
            self.config.base_url.trim_end_matches('/'),
            window.as_query(),
            self.config.per_page,
        )
    }

    /// Sleep until `request_delay` has passed since the previous request.
    fn pace(&self) {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.config.request_delay {
                std::thread::sleep(self.config.request_delay - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    /// One HTTP round trip, no retries.
    fn request_page(
        &self,
        url: &str,
        country_code: &str,
        indicator_code: &str,
    ) -> Result<Page, DataError> {
        self.pace();
        debug!("GET {url}");

        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() || e.is_request() {
                DataError::NetworkUnreachable(e.to_string())
            } else {
                DataError::Other(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::from_status(status.as_u16()));
        }

        let body = resp.text().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to read response body: {e}"))
        })?;

        parse_page(&body, country_code, indicator_code)
    }
}

impl IndicatorProvider for WorldBankClient {
    fn name(&self) -> &str {
        "world_bank"
    }

    fn fetch(
        &self,
        country_code: &str,
        indicator_code: &str,
        window: YearWindow,
    ) -> Result<Vec<RawObservation>, DataError> {
        let fetch_page = |page: u32| {
            let url = self.page_url(country_code, indicator_code, window, page);
            retry_fixed(self.config.max_retries, self.config.retry_delay, |_| {
                self.request_page(&url, country_code, indicator_code)
            })
        };

        let first = fetch_page(1)?;
        debug!(
            "{country_code}/{indicator_code}: {} observations over {} page(s)",
            first.total, first.pages
        );
        collect_pages(first, fetch_page)
    }
}

/// Decode one response body.
///
/// An upstream error body (`[{"message": [...]}]`) becomes `DataError::Api`.
/// Rows whose `date` is not a plain year are skipped.
pub fn parse_page(
    body: &str,
    country_code: &str,
    indicator_code: &str,
) -> Result<Page, DataError> {
    let parts: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("invalid JSON: {e}")))?;

    let head = parts
        .first()
        .ok_or_else(|| DataError::ResponseFormatChanged("empty response array".into()))?;

    if head.get("message").is_some() {
        let err: ApiErrorBody = serde_json::from_value(head.clone())
            .map_err(|e| DataError::ResponseFormatChanged(format!("error body: {e}")))?;
        let text = err
            .message
            .iter()
            .map(|m| format!("{}: {}", m.key, m.value))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(DataError::Api(text));
    }

    let meta: PageMeta = serde_json::from_value(head.clone())
        .map_err(|e| DataError::ResponseFormatChanged(format!("pagination metadata: {e}")))?;

    let rows: Vec<ObservationRow> = match parts.get(1) {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| DataError::ResponseFormatChanged(format!("observation list: {e}")))?,
    };

    let mut observations = Vec::with_capacity(rows.len());
    for row in rows {
        let Ok(year) = row.date.trim().parse::<i32>() else {
            debug!("skipping non-annual date '{}' for {country_code}/{indicator_code}", row.date);
            continue;
        };

        observations.push(RawObservation {
            country_code: country_code.to_string(),
            indicator_code: indicator_code.to_string(),
            year,
            value: decode_value(row.value),
            country_name: row.country.and_then(|n| n.value),
            indicator_name: row.indicator.and_then(|n| n.value),
        });
    }

    Ok(Page {
        page: meta.page,
        pages: meta.pages,
        total: meta.total,
        observations,
    })
}

fn decode_value(value: Option<serde_json::Value>) -> ObservedValue {
    match value {
        None | Some(serde_json::Value::Null) => ObservedValue::Missing,
        Some(serde_json::Value::Number(n)) => match n.as_f64() {
            Some(v) => ObservedValue::Number(v),
            None => ObservedValue::Unparseable(n.to_string()),
        },
        Some(serde_json::Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => ObservedValue::Number(v),
            _ => ObservedValue::Unparseable(s),
        },
        Some(other) => ObservedValue::Unparseable(other.to_string()),
    }
}

/// Concatenate `first` with pages `first.page + 1 ..= first.pages`.
///
/// Any page failure fails the whole series.
pub fn collect_pages<F>(first: Page, mut fetch_page: F) -> Result<Vec<RawObservation>, DataError>
where
    F: FnMut(u32) -> Result<Page, DataError>,
{
    let mut observations = first.observations;
    for page in (first.page.max(1) + 1)..=first.pages {
        let next = fetch_page(page)?;
        observations.extend(next.observations);
    }
    Ok(observations)
}

/// Run `op` up to `max_retries + 1` times with a fixed `delay` between
/// attempts. Non-retryable errors return immediately.
pub fn retry_fixed<T, F>(max_retries: u32, delay: Duration, mut op: F) -> Result<T, DataError>
where
    F: FnMut(u32) -> Result<T, DataError>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            std::thread::sleep(delay);
        }

        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                warn!("attempt {}/{} failed: {e}", attempt + 1, max_retries + 1);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(DataError::RetriesExhausted {
        attempts: max_retries + 1,
        last: Box::new(
            last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())),
        ),
    })
}
