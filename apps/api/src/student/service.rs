use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session::Identity;
use crate::errors::AppError;
use crate::intake::ResumeStorage;
use crate::models::application::{Application, ApplicationWithJob};
use crate::models::job::Job;
use crate::models::profile::{ProfileUpsert, StudentProfile};
use crate::store::PlacementStore;

#[derive(Debug, Serialize)]
pub struct StudentDashboard {
    pub jobs: Vec<Job>,
    pub applications: Vec<ApplicationWithJob>,
    pub profile: Option<StudentProfile>,
}

#[derive(Debug, PartialEq)]
pub enum ApplyOutcome {
    Submitted(Application),
    AlreadyApplied,
    /// No profile, or a profile without a résumé on file.
    ProfileIncomplete,
}

/// Editable profile fields. Every save sends all of them.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub contents: Bytes,
}

#[derive(Debug)]
pub struct ProfileUpdate {
    pub profile: StudentProfile,
    /// A file was supplied but failed the allow-list; the previous résumé
    /// reference was kept.
    pub resume_rejected: bool,
}

/// All jobs, the caller's applications, and the caller's profile.
pub async fn dashboard(
    store: &dyn PlacementStore,
    student: &Identity,
) -> Result<StudentDashboard, AppError> {
    Ok(StudentDashboard {
        jobs: store.list_jobs().await?,
        applications: store.list_applications_for_student(student.user_id).await?,
        profile: store.find_profile(student.user_id).await?,
    })
}

pub async fn profile(
    store: &dyn PlacementStore,
    student: &Identity,
) -> Result<Option<StudentProfile>, AppError> {
    Ok(store.find_profile(student.user_id).await?)
}

/// Applies the caller to a job. At most one application exists per
/// (job, student); the storage constraint decides races.
pub async fn apply(
    store: &dyn PlacementStore,
    student: &Identity,
    job_id: Uuid,
) -> Result<ApplyOutcome, AppError> {
    let profile = store.find_profile(student.user_id).await?;
    if !profile.as_ref().is_some_and(StudentProfile::has_resume) {
        return Ok(ApplyOutcome::ProfileIncomplete);
    }

    if store.find_job(job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    match store.insert_application(job_id, student.user_id).await {
        Ok(application) => {
            info!(
                "Student {} applied to job {} (application {})",
                student.user_id, job_id, application.id
            );
            Ok(ApplyOutcome::Submitted(application))
        }
        Err(e) if e.is_unique_violation() => Ok(ApplyOutcome::AlreadyApplied),
        Err(e) => Err(e.into()),
    }
}

/// Saves all profile fields, replacing the résumé only when a valid file
/// was uploaded.
pub async fn update_profile(
    store: &dyn PlacementStore,
    resumes: &ResumeStorage,
    student: &Identity,
    fields: ProfileFields,
    upload: Option<ResumeUpload>,
) -> Result<ProfileUpdate, AppError> {
    let existing = store.find_profile(student.user_id).await?;
    let mut resume = existing.and_then(|p| p.resume);
    let mut resume_rejected = false;

    if let Some(upload) = upload {
        match resumes.store(&upload.filename, &upload.contents).await? {
            Some(reference) => resume = Some(reference),
            None => {
                warn!(
                    "Student {} uploaded {:?}; keeping previous résumé",
                    student.user_id, upload.filename
                );
                resume_rejected = true;
            }
        }
    }

    let profile = store
        .upsert_profile(ProfileUpsert {
            user_id: student.user_id,
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            resume,
        })
        .await?;
    info!("Student {} updated profile {}", student.user_id, profile.id);

    Ok(ProfileUpdate {
        profile,
        resume_rejected,
    })
}
