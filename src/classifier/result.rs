//! Backend classification payloads.

use serde::{Deserialize, Serialize};

/// Request body for the classification endpoint.
#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub readings: &'a [f64],
}

/// Fields returned on a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub skin_type: String,
    pub ita_score: f64,
    pub spf_recommendation: String,
    pub reapply_time: String,
    pub uv_index: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ClassificationResult {
    /// The warning banner text, if the backend sent a non-empty one.
    pub fn warning(&self) -> Option<&str> {
        self.warning
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

/// Decoded classification response, discriminated by `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ClassificationResponse {
    Success(ClassificationResult),
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ClassificationResponse {
    /// Error text to show for a `status: error` response.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ClassificationResponse::Success(_) => None,
            ClassificationResponse::Error { message } => Some(
                message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or("Unknown"),
            ),
        }
    }
}
