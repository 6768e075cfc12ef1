//! Request extractors that resolve the caller's session and enforce roles.
//!
//! Every guarded handler takes one of these as an argument, so a missing
//! session or wrong role is rejected before the handler body runs. The
//! rejection is `AppError::Unauthorized`, which renders as a redirect to the
//! login page.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::auth::session::{read_cookie, Session};
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// Looks up the session named by the request cookie, if any.
async fn resolve_session(parts: &Parts, state: &AppState) -> Result<Option<Session>, AppError> {
    let Some(token) = read_cookie(&parts.headers, &state.config.session_cookie) else {
        return Ok(None);
    };
    Ok(state
        .sessions
        .load(token)
        .await?
        .map(|identity| Session {
            token: token.to_string(),
            identity,
        }))
}

async fn require_role(parts: &Parts, state: &AppState, role: Role) -> Result<Session, AppError> {
    match resolve_session(parts, state).await? {
        Some(session) if session.identity.role == role => Ok(session),
        Some(session) => {
            debug!(
                "Session for user {} has role {}, route requires {}",
                session.identity.user_id, session.identity.role, role
            );
            Err(AppError::Unauthorized)
        }
        None => Err(AppError::Unauthorized),
    }
}

/// Any caller; carries the session when one is present.
pub struct MaybeSession(pub Option<Session>);

/// A caller holding a valid admin session.
pub struct AdminSession(pub Session);

/// A caller holding a valid student session.
pub struct StudentSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve_session(parts, state).await?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Admin).await.map(AdminSession)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for StudentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        require_role(parts, state, Role::Student).await.map(StudentSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{login_as, test_state};
    use axum::http::{header, Request};

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("http://localhost/student/dashboard");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthorized() {
        let (state, _dir) = test_state();
        let mut parts = parts_with_cookie(None);
        let result = StudentSession::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let (state, _dir) = test_state();
        let mut parts = parts_with_cookie(Some("placement_session=forged"));
        let result = AdminSession::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_role_mismatch_is_unauthorized() {
        let (state, _dir) = test_state();
        let (_user, session) = login_as(&state, "alice", Role::Student).await;
        let cookie = format!("placement_session={}", session.token);

        let mut parts = parts_with_cookie(Some(&cookie));
        let result = AdminSession::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let mut parts = parts_with_cookie(Some(&cookie));
        let StudentSession(resolved) = StudentSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(resolved, session);
    }

    #[tokio::test]
    async fn test_maybe_session_tolerates_absence() {
        let (state, _dir) = test_state();
        let mut parts = parts_with_cookie(None);
        let MaybeSession(session) = MaybeSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(session.is_none());
    }
}
