use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session::Identity;
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationDetail, ApplicationStatus};
use crate::models::job::{Job, NewJob};
use crate::store::PlacementStore;

#[derive(Debug, Deserialize)]
pub struct JobForm {
    pub title: String,
    pub company: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub jobs: Vec<Job>,
    pub applications: Vec<ApplicationDetail>,
}

/// Result of a status change request that found its application.
#[derive(Debug, PartialEq)]
pub enum StatusUpdate {
    Updated(Application),
    /// The requested status is not one of Pending/Accepted/Rejected.
    /// The application was left untouched.
    InvalidStatus,
}

/// Every job and every application. Unpaginated.
pub async fn dashboard(store: &dyn PlacementStore) -> Result<AdminDashboard, AppError> {
    Ok(AdminDashboard {
        jobs: store.list_jobs().await?,
        applications: store.list_applications().await?,
    })
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Posts a job owned by the calling admin.
pub async fn post_job(
    store: &dyn PlacementStore,
    admin: &Identity,
    form: JobForm,
) -> Result<Job, AppError> {
    let job = store
        .insert_job(NewJob {
            title: required("title", form.title)?,
            company: required("company", form.company)?,
            description: required("description", form.description)?,
            posted_by: admin.user_id,
        })
        .await?;
    info!("Admin {} posted job {} ({})", admin.user_id, job.id, job.title);
    Ok(job)
}

/// Overwrites an application's status. Any transition is allowed.
pub async fn update_status(
    store: &dyn PlacementStore,
    admin: &Identity,
    application_id: Uuid,
    requested: &str,
) -> Result<StatusUpdate, AppError> {
    let existing = store
        .find_application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    let Ok(status) = requested.parse::<ApplicationStatus>() else {
        warn!("Admin {} sent invalid status {requested:?}", admin.user_id);
        return Ok(StatusUpdate::InvalidStatus);
    };

    let updated = store
        .set_application_status(existing.id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    info!(
        "Admin {} moved application {} from {} to {}",
        admin.user_id, updated.id, existing.status, updated.status
    );
    Ok(StatusUpdate::Updated(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{NewUser, Role};
    use crate::store::memory::MemoryStore;

    async fn seed_user(store: &MemoryStore, username: &str, role: Role) -> Identity {
        let user = store
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap();
        Identity {
            user_id: user.id,
            role,
        }
    }

    fn job_form(title: &str) -> JobForm {
        JobForm {
            title: title.to_string(),
            company: "Acme".to_string(),
            description: "Build things".to_string(),
        }
    }

    #[tokio::test]
    async fn test_post_job_records_poster() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "root", Role::Admin).await;

        let job = post_job(&store, &admin, job_form("Engineer")).await.unwrap();
        assert_eq!(job.posted_by, admin.user_id);
        assert_eq!(dashboard(&store).await.unwrap().jobs, vec![job]);
    }

    #[tokio::test]
    async fn test_post_job_requires_every_field() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "root", Role::Admin).await;

        let mut form = job_form("Engineer");
        form.company = "  ".to_string();
        let result = post_job(&store, &admin, form).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.list_jobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_status_transitions_freely() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "root", Role::Admin).await;
        let student = seed_user(&store, "alice", Role::Student).await;
        let job = post_job(&store, &admin, job_form("Engineer")).await.unwrap();
        let application = store
            .insert_application(job.id, student.user_id)
            .await
            .unwrap();

        for status in ["Accepted", "Pending", "Rejected", "Accepted"] {
            let outcome = update_status(&store, &admin, application.id, status)
                .await
                .unwrap();
            let StatusUpdate::Updated(updated) = outcome else {
                panic!("expected update to {status}");
            };
            assert_eq!(updated.status.as_str(), status);
        }
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_application_unchanged() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "root", Role::Admin).await;
        let student = seed_user(&store, "alice", Role::Student).await;
        let job = post_job(&store, &admin, job_form("Engineer")).await.unwrap();
        let application = store
            .insert_application(job.id, student.user_id)
            .await
            .unwrap();
        update_status(&store, &admin, application.id, "Accepted")
            .await
            .unwrap();

        for bogus in ["Hired", "accepted", ""] {
            let outcome = update_status(&store, &admin, application.id, bogus)
                .await
                .unwrap();
            assert_eq!(outcome, StatusUpdate::InvalidStatus);
        }
        let stored = store.find_application(application.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_update_status_unknown_application_is_not_found() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "root", Role::Admin).await;
        let result = update_status(&store, &admin, Uuid::new_v4(), "Accepted").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dashboard_lists_applicants() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "root", Role::Admin).await;
        let alice = seed_user(&store, "alice", Role::Student).await;
        let bob = seed_user(&store, "bob", Role::Student).await;
        let job = post_job(&store, &admin, job_form("Engineer")).await.unwrap();
        store.insert_application(job.id, alice.user_id).await.unwrap();
        store.insert_application(job.id, bob.user_id).await.unwrap();

        let view = dashboard(&store).await.unwrap();
        let mut applicants: Vec<_> = view
            .applications
            .iter()
            .map(|a| a.applicant_username.as_str())
            .collect();
        applicants.sort();
        assert_eq!(applicants, vec!["alice", "bob"]);
        assert!(view.applications.iter().all(|a| a.job.id == job.id));
    }
}
