use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;

use crate::accounts::service::{self, LoginForm, RegisterForm, RegistrationPolicy};
use crate::auth::guard::MaybeSession;
use crate::auth::session::{expired_session_cookie, session_cookie, Identity};
use crate::errors::{AppError, LOGIN_PATH};
use crate::models::user::User;
use crate::state::AppState;
use crate::views::{render, Blank, PageView};

#[derive(Serialize)]
pub struct HomeView {
    pub identity: Option<Identity>,
}

#[derive(Serialize)]
pub struct RegisteredResponse {
    pub notice: &'static str,
    pub redirect: &'static str,
    pub user: User,
}

/// GET /
pub async fn handle_index(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<PageView<HomeView>>, AppError> {
    let identity = session.as_ref().map(|s| s.identity);
    Ok(Json(
        render(&state, session.as_ref(), "index", HomeView { identity }).await?,
    ))
}

/// GET /login
pub async fn handle_login_page(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<PageView<Blank>>, AppError> {
    Ok(Json(render(&state, session.as_ref(), "login", Blank {}).await?))
}

/// POST /login
/// Sets the session cookie and sends the user to their role's dashboard.
pub async fn handle_login(
    State(state): State<AppState>,
    MaybeSession(previous): MaybeSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let session = service::login(
        state.store.as_ref(),
        state.sessions.as_ref(),
        form,
        previous.as_ref(),
    )
    .await?;
    let cookie = session_cookie(
        &state.config.session_cookie,
        &session.token,
        state.config.session_ttl_secs,
        state.config.session_cookie_secure,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to(session.identity.role.dashboard_path()),
    )
        .into_response())
}

/// GET /register
pub async fn handle_register_page(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<PageView<Blank>>, AppError> {
    Ok(Json(render(&state, session.as_ref(), "register", Blank {}).await?))
}

/// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, Json<RegisteredResponse>), AppError> {
    let policy = RegistrationPolicy {
        allow_admin_signup: state.config.allow_admin_signup,
        hashing: state.config.password_hashing,
    };
    let user = service::register(state.store.as_ref(), policy, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            notice: "Registration successful. Please login.",
            redirect: LOGIN_PATH,
            user,
        }),
    ))
}

/// GET /logout
pub async fn handle_logout(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Response, AppError> {
    service::logout(state.sessions.as_ref(), session.as_ref()).await?;
    Ok((
        [(
            header::SET_COOKIE,
            expired_session_cookie(&state.config.session_cookie),
        )],
        Redirect::to("/"),
    )
        .into_response())
}
