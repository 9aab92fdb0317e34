use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::cv::models::CvRecord;

/// A stored CV, one per user. Mirrors [`CvRecord`] plus bookkeeping columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvRecordRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub work_experience: Vec<String>,
    pub education: Vec<String>,
    pub skills: Vec<String>,
    pub photo: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CvRecordRow> for CvRecord {
    type Error = serde_json::Error;

    fn try_from(row: CvRecordRow) -> Result<Self, Self::Error> {
        let photo = row.photo.map(serde_json::from_value).transpose()?;
        Ok(CvRecord {
            name: row.name,
            email: row.email,
            phone: row.phone,
            work_experience: row.work_experience,
            education: row.education,
            skills: row.skills,
            photo,
        })
    }
}
