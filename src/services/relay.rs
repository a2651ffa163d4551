use crate::models::{Submission, SubmitQuizRequest, SubmitQuizResponse, UserProfile};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the submission service
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: missing or rejected token")]
    Unauthorized,
}

/// HTTP client for the quiz submission service
///
/// Used by the wizard to relay a finished quiz and by the status view to
/// fetch the stored profile.
pub struct SubmissionClient {
    base_url: String,
    client: Client,
}

impl SubmissionClient {
    /// Create a new client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Submit a finished quiz, returning the stored record
    pub async fn submit(
        &self,
        token: &str,
        request: &SubmitQuizRequest,
    ) -> Result<Submission, RelayError> {
        let response = self
            .client
            .post(self.url("/api/submit-quiz"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(RelayError::Unauthorized),
            status if !status.is_success() => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Failed to submit quiz for {}: {} - {}", request.email, status, body);
                return Err(RelayError::ApiError(format!("Failed to submit quiz: {}", status)));
            }
            _ => {}
        }

        let body: SubmitQuizResponse = response.json().await?;
        tracing::debug!("Relayed submission {} for {}", body.quiz.id, body.quiz.email);

        Ok(body.quiz)
    }

    /// Fetch the stored profile projection for `email`
    pub async fn fetch_profile(&self, email: &str) -> Result<Option<UserProfile>, RelayError> {
        let path = format!("/api/user/{}", urlencoding::encode(email));
        let response = self.client.get(self.url(&path)).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(RelayError::ApiError(format!(
                "Failed to fetch profile: {}",
                status
            ))),
        }
    }
}
