use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, ApplicationWithJob,
};
use crate::models::job::{Job, NewJob};
use crate::models::profile::{ProfileUpsert, StudentProfile};
use crate::models::user::{NewUser, User};
use crate::store::{PlacementStore, StoreError, StoreResult};

/// PostgreSQL-backed store. Uniqueness of usernames, profiles and
/// (job, student) applications is enforced by table constraints.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Database entity models

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = row
            .role
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("user {}: {e}", row.id)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    email: String,
    phone: String,
    resume: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for StudentProfile {
    fn from(row: ProfileRow) -> Self {
        StudentProfile {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            resume: row.resume,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    company: String,
    description: String,
    posted_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            title: row.title,
            company: row.company,
            description: row.description,
            posted_by: row.posted_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    student_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(id: Uuid, raw: &str) -> StoreResult<ApplicationStatus> {
    raw.parse()
        .map_err(|e| StoreError::CorruptRow(format!("application {id}: {e}")))
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> StoreResult<Self> {
        Ok(Application {
            status: parse_status(row.id, &row.status)?,
            id: row.id,
            job_id: row.job_id,
            student_id: row.student_id,
            created_at: row.created_at,
        })
    }
}

/// Application joined with its job and applicant, flattened by column alias.
#[derive(Debug, FromRow)]
struct ApplicationJoinRow {
    id: Uuid,
    job_id: Uuid,
    student_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    job_title: String,
    job_company: String,
    job_description: String,
    job_posted_by: Uuid,
    job_created_at: DateTime<Utc>,
    applicant_username: String,
}

impl ApplicationJoinRow {
    fn split(self) -> StoreResult<(Application, Job, String)> {
        let job = Job {
            id: self.job_id,
            title: self.job_title,
            company: self.job_company,
            description: self.job_description,
            posted_by: self.job_posted_by,
            created_at: self.job_created_at,
        };
        let application = Application {
            status: parse_status(self.id, &self.status)?,
            id: self.id,
            job_id: self.job_id,
            student_id: self.student_id,
            created_at: self.created_at,
        };
        Ok((application, job, self.applicant_username))
    }
}

const APPLICATION_JOIN_SELECT: &str = r#"
    SELECT a.id, a.job_id, a.student_id, a.status, a.created_at,
           j.title AS job_title, j.company AS job_company,
           j.description AS job_description, j.posted_by AS job_posted_by,
           j.created_at AS job_created_at,
           u.username AS applicant_username
    FROM applications a
    JOIN jobs j ON j.id = a.job_id
    JOIN users u ON u.id = a.student_id
"#;

#[async_trait]
impl PlacementStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<StudentProfile>> {
        Ok(
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM student_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
                .map(StudentProfile::from),
        )
    }

    async fn upsert_profile(&self, profile: ProfileUpsert) -> StoreResult<StudentProfile> {
        // Single statement so concurrent first saves cannot create two rows.
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO student_profiles (id, user_id, name, email, phone, resume)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                resume = EXCLUDED.resume,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(profile.user_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.resume)
        .fetch_one(&self.pool)
        .await?;
        debug!("Upserted profile for user {}", profile.user_id);
        Ok(row.into())
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, title, company, description, posted_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(job.posted_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Job::from))
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(Job::from)
                .collect(),
        )
    }

    async fn insert_application(
        &self,
        job_id: Uuid,
        student_id: Uuid,
    ) -> StoreResult<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications (id, job_id, student_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(student_id)
        .bind(ApplicationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        sqlx::query_as::<_, ApplicationRow>(
            "UPDATE applications SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Application::try_from)
        .transpose()
    }

    async fn list_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> StoreResult<Vec<ApplicationWithJob>> {
        let query = format!("{APPLICATION_JOIN_SELECT} WHERE a.student_id = $1 ORDER BY a.created_at ASC");
        sqlx::query_as::<_, ApplicationJoinRow>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| -> StoreResult<ApplicationWithJob> {
                let (application, job, _) = row.split()?;
                Ok(ApplicationWithJob { application, job })
            })
            .collect()
    }

    async fn list_applications(&self) -> StoreResult<Vec<ApplicationDetail>> {
        let query = format!("{APPLICATION_JOIN_SELECT} ORDER BY a.created_at ASC");
        sqlx::query_as::<_, ApplicationJoinRow>(&query)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| -> StoreResult<ApplicationDetail> {
                let (application, job, applicant_username) = row.split()?;
                Ok(ApplicationDetail {
                    application,
                    job,
                    applicant_username,
                })
            })
            .collect()
    }
}
