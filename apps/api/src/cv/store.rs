//! Server-side storage of CV records and user profiles.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::cv::models::{CvRecord, UserProfile};
use crate::errors::AppError;
use crate::models::cv::CvRecordRow;
use crate::models::user::UserProfileRow;

/// Carried in `AppState` as `Arc<dyn CvStore>`.
#[async_trait]
pub trait CvStore: Send + Sync {
    async fn get_cv(&self, user_id: Uuid) -> Result<Option<CvRecord>, AppError>;

    /// Replaces the user's record wholesale.
    async fn put_cv(&self, user_id: Uuid, record: &CvRecord) -> Result<(), AppError>;

    async fn delete_cv(&self, user_id: Uuid) -> Result<(), AppError>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError>;

    async fn put_profile(&self, user_id: Uuid, profile: &UserProfile) -> Result<(), AppError>;
}

pub struct PgCvStore {
    pool: PgPool,
}

impl PgCvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvStore for PgCvStore {
    async fn get_cv(&self, user_id: Uuid) -> Result<Option<CvRecord>, AppError> {
        let row: Option<CvRecordRow> =
            sqlx::query_as("SELECT * FROM cv_records WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(CvRecord::try_from)
            .transpose()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Corrupt photo column for {user_id}: {e}")))
    }

    async fn put_cv(&self, user_id: Uuid, record: &CvRecord) -> Result<(), AppError> {
        let photo = record
            .photo
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::Internal(e.into()))?;

        sqlx::query(
            r#"
            INSERT INTO cv_records
                (user_id, name, email, phone, work_experience, education, skills, photo, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (user_id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                work_experience = EXCLUDED.work_experience,
                education = EXCLUDED.education,
                skills = EXCLUDED.skills,
                photo = EXCLUDED.photo,
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.work_experience)
        .bind(&record.education)
        .bind(&record.skills)
        .bind(photo)
        .execute(&self.pool)
        .await?;

        info!("Stored CV for user {user_id}");
        Ok(())
    }

    async fn delete_cv(&self, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM cv_records WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        info!(
            "Cleared CV for user {user_id} ({} row(s))",
            result.rows_affected()
        );
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let row: Option<UserProfileRow> =
            sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(UserProfile::from))
    }

    async fn put_profile(&self, user_id: Uuid, profile: &UserProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, name, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
