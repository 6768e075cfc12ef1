pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::admin::handlers as admin;
use crate::state::AppState;
use crate::student::handlers as student;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(accounts::handle_index))
        .route(
            "/login",
            get(accounts::handle_login_page).post(accounts::handle_login),
        )
        .route(
            "/register",
            get(accounts::handle_register_page).post(accounts::handle_register),
        )
        .route("/logout", get(accounts::handle_logout))
        // Admin
        .route("/admin/dashboard", get(admin::handle_dashboard))
        .route(
            "/admin/add_job",
            get(admin::handle_add_job_page).post(admin::handle_add_job),
        )
        .route("/admin/update_status/:id", post(admin::handle_update_status))
        // Student
        .route("/student/dashboard", get(student::handle_dashboard))
        .route("/student/apply/:job_id", get(student::handle_apply))
        .route(
            "/student/profile",
            get(student::handle_profile_page).post(student::handle_update_profile),
        )
        .layer(body_limit)
        .with_state(state)
}
