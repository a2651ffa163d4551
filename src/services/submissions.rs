use crate::models::{ProfileStatus, Submission, SubmitQuizRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur when persisting submissions
#[derive(Debug, Error)]
pub enum SubmissionStoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid stored value: {0}")]
    InvalidData(String),
}

/// Document collection of quiz submissions, unique by email
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Submission>, SubmissionStoreError>;

    /// Insert a new submission, or overwrite `answers` and `phoneNumber` of the
    /// existing one for the same email and reset its status to pending
    async fn upsert(&self, request: &SubmitQuizRequest) -> Result<Submission, SubmissionStoreError>;

    /// Move a submission to the next review status
    ///
    /// Returns `false` when no submission exists for `email` or `next` is not
    /// the immediate successor of the stored status.
    async fn advance_status(
        &self,
        email: &str,
        next: ProfileStatus,
    ) -> Result<bool, SubmissionStoreError>;

    async fn health_check(&self) -> Result<bool, SubmissionStoreError>;
}

/// In-process submission store
#[derive(Debug, Default)]
pub struct MemorySubmissionStore {
    records: RwLock<HashMap<String, Submission>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Submission>, SubmissionStoreError> {
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn upsert(&self, request: &SubmitQuizRequest) -> Result<Submission, SubmissionStoreError> {
        let mut records = self.records.write().await;
        let record = records
            .entry(request.email.clone())
            .and_modify(|existing| {
                existing.answers = request.answers.clone();
                existing.phone_number = request.phone_number.clone();
                existing.status = ProfileStatus::Pending;
            })
            .or_insert_with(|| Submission {
                id: uuid::Uuid::new_v4(),
                user_id: request.user_id.clone(),
                email: request.email.clone(),
                name: request.name.clone(),
                phone_number: request.phone_number.clone(),
                answers: request.answers.clone(),
                status: ProfileStatus::Pending,
                created_at: chrono::Utc::now(),
            });

        Ok(record.clone())
    }

    async fn advance_status(
        &self,
        email: &str,
        next: ProfileStatus,
    ) -> Result<bool, SubmissionStoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(email) else {
            return Ok(false);
        };
        if !record.status.can_transition_to(next) {
            tracing::warn!(
                "Refusing status change for {}: {} -> {}",
                email,
                record.status,
                next
            );
            return Ok(false);
        }

        record.status = next;
        Ok(true)
    }

    async fn health_check(&self) -> Result<bool, SubmissionStoreError> {
        Ok(true)
    }
}
