use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use uuid::Uuid;

use crate::admin::service::{self, AdminDashboard, JobForm, StatusForm, StatusUpdate};
use crate::auth::guard::AdminSession;
use crate::errors::AppError;
use crate::state::AppState;
use crate::views::{redirect_with_notices, render, Blank, PageView};

const DASHBOARD_PATH: &str = "/admin/dashboard";

/// GET /admin/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Json<PageView<AdminDashboard>>, AppError> {
    let data = service::dashboard(state.store.as_ref()).await?;
    Ok(Json(render(&state, Some(&session), "admin_dashboard", data).await?))
}

/// GET /admin/add_job
pub async fn handle_add_job_page(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Result<Json<PageView<Blank>>, AppError> {
    Ok(Json(render(&state, Some(&session), "add_job", Blank {}).await?))
}

/// POST /admin/add_job
pub async fn handle_add_job(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Form(form): Form<JobForm>,
) -> Result<Redirect, AppError> {
    service::post_job(state.store.as_ref(), &session.identity, form).await?;
    redirect_with_notices(&state, &session, &["Job posted successfully"], DASHBOARD_PATH).await
}

/// POST /admin/update_status/:id
pub async fn handle_update_status(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(id): Path<Uuid>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let outcome =
        service::update_status(state.store.as_ref(), &session.identity, id, &form.status).await?;
    let notice = match outcome {
        StatusUpdate::Updated(_) => "Application status updated",
        StatusUpdate::InvalidStatus => "Invalid status",
    };
    redirect_with_notices(&state, &session, &[notice], DASHBOARD_PATH).await
}
