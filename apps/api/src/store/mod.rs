//! Persistence boundary for users, profiles, jobs and applications.
//!
//! `AppState` carries an `Arc<dyn PlacementStore>`. Production uses
//! [`postgres::PgStore`]; tests swap in an in-memory implementation.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, ApplicationWithJob,
};
use crate::models::job::{Job, NewJob};
use crate::models::profile::{ProfileUpsert, StudentProfile};
use crate::models::user::{NewUser, User};

/// Storage failures that callers are expected to branch on.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violation on {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced parent row does not exist.
    #[error("Foreign key violation on {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation { constraint };
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait PlacementStore: Send + Sync {
    /// Fails with `UniqueViolation` when the username is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    /// Exact, case-sensitive match.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<StudentProfile>>;
    /// Creates the profile or overwrites every field of the existing one.
    async fn upsert_profile(&self, profile: ProfileUpsert) -> StoreResult<StudentProfile>;

    async fn insert_job(&self, job: NewJob) -> StoreResult<Job>;
    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;

    /// Creates a Pending application. Fails with `UniqueViolation` when the
    /// student already applied to this job.
    async fn insert_application(&self, job_id: Uuid, student_id: Uuid)
        -> StoreResult<Application>;
    async fn find_application(&self, id: Uuid) -> StoreResult<Option<Application>>;
    /// Returns `None` when no application has this id.
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>>;
    async fn list_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> StoreResult<Vec<ApplicationWithJob>>;
    async fn list_applications(&self) -> StoreResult<Vec<ApplicationDetail>>;
}
