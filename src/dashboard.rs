//! # UV Dashboard Endpoints
//!
//! One-shot reads of the dashboard's current and history UV endpoints, and the
//! fixed-threshold UV category lookup used to label them.

use crate::error::ScanError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Latest UV reading; both fields are null before the first measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUv {
    #[serde(default)]
    pub uv: Option<f64>,
    #[serde(default, deserialize_with = "de_optional_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One history point, oldest first in the endpoint's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvSample {
    pub uv: f64,
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Parses a backend timestamp. Offset-less ISO 8601 values are read as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
}

fn de_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(de::Error::custom)
}

fn de_optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .map(|text| parse_timestamp(&text).map_err(de::Error::custom))
        .transpose()
}

/// UV index category with the usual WHO thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvCategory {
    Unknown,
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvCategory {
    pub fn from_index(uv: Option<f64>) -> Self {
        match uv {
            None => UvCategory::Unknown,
            Some(v) if v.is_nan() => UvCategory::Unknown,
            Some(v) if v <= 2.0 => UvCategory::Low,
            Some(v) if v <= 5.0 => UvCategory::Moderate,
            Some(v) if v <= 7.0 => UvCategory::High,
            Some(v) if v <= 10.0 => UvCategory::VeryHigh,
            Some(_) => UvCategory::Extreme,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvCategory::Unknown => "Unknown",
            UvCategory::Low => "Low",
            UvCategory::Moderate => "Moderate",
            UvCategory::High => "High",
            UvCategory::VeryHigh => "Very High",
            UvCategory::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for UvCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Client for the read-only UV endpoints.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: reqwest::Client,
    current_url: String,
    history_url: String,
}

impl DashboardClient {
    pub fn new(
        current_url: impl Into<String>,
        history_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::HttpError(e.to_string()))?;
        Ok(DashboardClient {
            client,
            current_url: current_url.into(),
            history_url: history_url.into(),
        })
    }

    pub async fn fetch_current(&self) -> Result<CurrentUv, ScanError> {
        let response = self
            .client
            .get(&self.current_url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn fetch_history(&self) -> Result<Vec<UvSample>, ScanError> {
        let response = self
            .client
            .get(&self.history_url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}
