use serde::{Deserialize, Serialize};
use crate::models::domain::Submission;

/// Response for the submit endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitQuizResponse {
    pub success: bool,
    pub quiz: Submission,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
        }
    }
}
