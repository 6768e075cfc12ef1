//! In-memory `PlacementStore` for tests. Mirrors the uniqueness and foreign
//! key constraints of the PostgreSQL schema.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, ApplicationWithJob,
};
use crate::models::job::{Job, NewJob};
use crate::models::profile::{ProfileUpsert, StudentProfile};
use crate::models::user::{NewUser, User};
use crate::store::{PlacementStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<StudentProfile>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub fn application_count(&self, job_id: Uuid, student_id: Uuid) -> usize {
        self.tables
            .lock()
            .unwrap()
            .applications
            .iter()
            .filter(|a| a.job_id == job_id && a.student_id == student_id)
            .count()
    }

    pub fn profile_count(&self, user_id: Uuid) -> usize {
        self.tables
            .lock()
            .unwrap()
            .profiles
            .iter()
            .filter(|p| p.user_id == user_id)
            .count()
    }
}

fn fk_violation(constraint: &str) -> StoreError {
    StoreError::ForeignKeyViolation {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl PlacementStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation {
                constraint: "users_username_key".to_string(),
            });
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<StudentProfile>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn upsert_profile(&self, profile: ProfileUpsert) -> StoreResult<StudentProfile> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.iter().any(|u| u.id == profile.user_id) {
            return Err(fk_violation("student_profiles_user_id_fkey"));
        }
        if let Some(existing) = tables
            .profiles
            .iter_mut()
            .find(|p| p.user_id == profile.user_id)
        {
            existing.name = profile.name;
            existing.email = profile.email;
            existing.phone = profile.phone;
            existing.resume = profile.resume;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }
        let created = StudentProfile {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            resume: profile.resume,
            updated_at: Utc::now(),
        };
        tables.profiles.push(created.clone());
        Ok(created)
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.iter().any(|u| u.id == job.posted_by) {
            return Err(fk_violation("jobs_posted_by_fkey"));
        }
        let created = Job {
            id: Uuid::new_v4(),
            title: job.title,
            company: job.company,
            description: job.description,
            posted_by: job.posted_by,
            created_at: Utc::now(),
        };
        tables.jobs.push(created.clone());
        Ok(created)
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        Ok(self.tables.lock().unwrap().jobs.clone())
    }

    async fn insert_application(
        &self,
        job_id: Uuid,
        student_id: Uuid,
    ) -> StoreResult<Application> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.jobs.iter().any(|j| j.id == job_id) {
            return Err(fk_violation("applications_job_id_fkey"));
        }
        if !tables.users.iter().any(|u| u.id == student_id) {
            return Err(fk_violation("applications_student_id_fkey"));
        }
        if tables
            .applications
            .iter()
            .any(|a| a.job_id == job_id && a.student_id == student_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "applications_job_student_key".to_string(),
            });
        }
        let created = Application {
            id: Uuid::new_v4(),
            job_id,
            student_id,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };
        tables.applications.push(created.clone());
        Ok(created)
    }

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<Application>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .map(|a| {
                a.status = status;
                a.clone()
            }))
    }

    async fn list_applications_for_student(
        &self,
        student_id: Uuid,
    ) -> StoreResult<Vec<ApplicationWithJob>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .applications
            .iter()
            .filter(|a| a.student_id == student_id)
            .filter_map(|a| {
                let job = tables.jobs.iter().find(|j| j.id == a.job_id)?;
                Some(ApplicationWithJob {
                    application: a.clone(),
                    job: job.clone(),
                })
            })
            .collect())
    }

    async fn list_applications(&self) -> StoreResult<Vec<ApplicationDetail>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .applications
            .iter()
            .filter_map(|a| {
                let job = tables.jobs.iter().find(|j| j.id == a.job_id)?;
                let applicant = tables.users.iter().find(|u| u.id == a.student_id)?;
                Some(ApplicationDetail {
                    application: a.clone(),
                    job: job.clone(),
                    applicant_username: applicant.username.clone(),
                })
            })
            .collect())
    }
}
