use crate::models::{AnswerSet, ProfileStatus, Submission, SubmitQuizRequest};
use crate::services::submissions::{SubmissionStore, SubmissionStoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;

/// Submission status as stored in the `submission_status` enum column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
pub enum StatusColumn {
    Pending,
    Matched,
    Contacted,
}

impl From<ProfileStatus> for StatusColumn {
    fn from(value: ProfileStatus) -> Self {
        match value {
            ProfileStatus::Pending => StatusColumn::Pending,
            ProfileStatus::Matched => StatusColumn::Matched,
            ProfileStatus::Contacted => StatusColumn::Contacted,
        }
    }
}

impl From<StatusColumn> for ProfileStatus {
    fn from(value: StatusColumn) -> Self {
        match value {
            StatusColumn::Pending => ProfileStatus::Pending,
            StatusColumn::Matched => ProfileStatus::Matched,
            StatusColumn::Contacted => ProfileStatus::Contacted,
        }
    }
}

/// PostgreSQL document collection for quiz submissions
///
/// Answers are stored as a JSONB document next to the identity columns.
/// `email` is unique, so the upsert is a single atomic statement.
pub struct PostgresSubmissionStore {
    pool: PgPool,
}

impl PostgresSubmissionStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, SubmissionStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, SubmissionStoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn submission_from_row(row: &PgRow) -> Result<Submission, SubmissionStoreError> {
    let status: StatusColumn = row.try_get("status")?;
    let Json(answers): Json<AnswerSet> = row.try_get("answers")?;

    Ok(Submission {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        phone_number: row.try_get("phone_number")?,
        answers,
        status: status.into(),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SubmissionStore for PostgresSubmissionStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Submission>, SubmissionStoreError> {
        let query = r#"
            SELECT id, user_id, email, name, phone_number, answers, status, created_at
            FROM quiz_submissions
            WHERE email = $1
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(submission_from_row).transpose()
    }

    /// Uses INSERT ... ON CONFLICT so two submissions for one email never
    /// produce two rows.
    async fn upsert(&self, request: &SubmitQuizRequest) -> Result<Submission, SubmissionStoreError> {
        let query = r#"
            INSERT INTO quiz_submissions (id, user_id, email, name, phone_number, answers, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW())
            ON CONFLICT (email)
            DO UPDATE SET
                answers = EXCLUDED.answers,
                phone_number = EXCLUDED.phone_number,
                status = 'pending'
            RETURNING id, user_id, email, name, phone_number, answers, status, created_at
        "#;

        let row = sqlx::query(query)
            .bind(uuid::Uuid::new_v4())
            .bind(&request.user_id)
            .bind(&request.email)
            .bind(&request.name)
            .bind(&request.phone_number)
            .bind(Json(&request.answers))
            .fetch_one(&self.pool)
            .await?;

        let submission = submission_from_row(&row)?;
        tracing::debug!("Upserted submission {} for {}", submission.id, submission.email);

        Ok(submission)
    }

    /// The status guard in the WHERE clause keeps a concurrent change from
    /// being overwritten.
    async fn advance_status(
        &self,
        email: &str,
        next: ProfileStatus,
    ) -> Result<bool, SubmissionStoreError> {
        let Some(current) = self.find_by_email(email).await? else {
            return Ok(false);
        };
        if !current.status.can_transition_to(next) {
            tracing::warn!(
                "Refusing status change for {}: {} -> {}",
                email,
                current.status,
                next
            );
            return Ok(false);
        }

        let query = r#"
            UPDATE quiz_submissions
            SET status = $2
            WHERE email = $1 AND status = $3
        "#;

        let result = sqlx::query(query)
            .bind(email)
            .bind(StatusColumn::from(next))
            .bind(StatusColumn::from(current.status))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, SubmissionStoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
