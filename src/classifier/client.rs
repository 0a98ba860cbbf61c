//! # Reading Classifier Client
//!
//! Sends one sensor frame's readings to the backend classification endpoint
//! as `POST {"readings":[...18 numbers]}` and decodes the structured answer.

use crate::classifier::result::{ClassificationResponse, ClassifyRequest};
use crate::device::frame::Readings;
use crate::error::ScanError;
use log::debug;
use std::time::Duration;

/// Classifies a set of channel readings.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync + 'static {
    /// One network round trip. Transport failures and non-success HTTP
    /// statuses are errors; a backend `status: error` is a normal response.
    async fn classify(&self, readings: &Readings) -> Result<ClassificationResponse, ScanError>;
}

/// Classifier backed by the dashboard's HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::HttpError(e.to_string()))?;
        Ok(HttpClassifier {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, readings: &Readings) -> Result<ClassificationResponse, ScanError> {
        debug!("POST {} with {} readings", self.url, readings.len());
        let response = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { readings })
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<ClassificationResponse>().await?)
    }
}
