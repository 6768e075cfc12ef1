use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-to-one with a student account. Created on the first profile save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Path of the uploaded résumé inside the upload directory.
    pub resume: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StudentProfile {
    /// Applying to jobs requires a résumé on file.
    pub fn has_resume(&self) -> bool {
        self.resume.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Full replacement of the editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpsert {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub resume: Option<String>,
}
