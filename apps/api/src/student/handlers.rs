use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::guard::StudentSession;
use crate::errors::AppError;
use crate::models::profile::StudentProfile;
use crate::state::AppState;
use crate::student::service::{
    self, ApplyOutcome, ProfileFields, ResumeUpload, StudentDashboard,
};
use crate::views::{redirect_with_notices, render, PageView};

const DASHBOARD_PATH: &str = "/student/dashboard";

#[derive(Serialize)]
pub struct ProfileView {
    pub profile: Option<StudentProfile>,
}

/// GET /student/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
) -> Result<Json<PageView<StudentDashboard>>, AppError> {
    let data = service::dashboard(state.store.as_ref(), &session.identity).await?;
    Ok(Json(render(&state, Some(&session), "student_dashboard", data).await?))
}

/// GET /student/apply/:job_id
pub async fn handle_apply(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
    Path(job_id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let notice = match service::apply(state.store.as_ref(), &session.identity, job_id).await? {
        ApplyOutcome::Submitted(_) => "Application submitted successfully",
        ApplyOutcome::AlreadyApplied => "You have already applied for this job",
        ApplyOutcome::ProfileIncomplete => "Please upload your profile and resume before applying",
    };
    redirect_with_notices(&state, &session, &[notice], DASHBOARD_PATH).await
}

/// GET /student/profile
pub async fn handle_profile_page(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
) -> Result<Json<PageView<ProfileView>>, AppError> {
    let profile = service::profile(state.store.as_ref(), &session.identity).await?;
    Ok(Json(
        render(&state, Some(&session), "student_profile", ProfileView { profile }).await?,
    ))
}

fn bad_multipart(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge("profile upload exceeds the size limit".to_string());
    }
    AppError::Validation(format!("malformed profile form: {e}"))
}

/// POST /student/profile (multipart: name, email, phone, optional resume file)
pub async fn handle_update_profile(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut name = None;
    let mut email = None;
    let mut phone = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await.map_err(bad_multipart)?),
            "email" => email = Some(field.text().await.map_err(bad_multipart)?),
            "phone" => phone = Some(field.text().await.map_err(bad_multipart)?),
            "resume" => {
                // Browsers send an empty filename when no file was chosen.
                let filename = field.file_name().unwrap_or_default().to_string();
                let contents = field.bytes().await.map_err(bad_multipart)?;
                if !filename.is_empty() {
                    upload = Some(ResumeUpload { filename, contents });
                }
            }
            _ => {}
        }
    }

    let missing = |field: &str| AppError::Validation(format!("{field} is required"));
    let fields = ProfileFields {
        name: name.ok_or_else(|| missing("name"))?,
        email: email.ok_or_else(|| missing("email"))?,
        phone: phone.ok_or_else(|| missing("phone"))?,
    };

    let update = service::update_profile(
        state.store.as_ref(),
        &state.resumes,
        &session.identity,
        fields,
        upload,
    )
    .await?;

    debug!(
        "Profile {} saved, résumé on file: {}",
        update.profile.id,
        update.profile.has_resume()
    );

    let mut notices = vec!["Profile updated successfully"];
    if update.resume_rejected {
        notices.push("Resume not updated: only PDF files are accepted");
    }
    redirect_with_notices(&state, &session, &notices, DASHBOARD_PATH).await
}
