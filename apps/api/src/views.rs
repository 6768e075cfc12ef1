use axum::response::Redirect;
use serde::Serialize;

use crate::auth::session::Session;
use crate::errors::AppError;
use crate::state::AppState;

/// JSON view model handed to the presentation layer. `data` is flattened
/// into the top-level object next to `page` and `notices`.
#[derive(Debug, Serialize)]
pub struct PageView<T: Serialize> {
    pub page: &'static str,
    pub notices: Vec<String>,
    #[serde(flatten)]
    pub data: T,
}

/// Page without any data of its own.
#[derive(Debug, Serialize)]
pub struct Blank {}

/// Builds a page, draining the session's pending notices when there is one.
pub async fn render<T: Serialize>(
    state: &AppState,
    session: Option<&Session>,
    page: &'static str,
    data: T,
) -> Result<PageView<T>, AppError> {
    let notices = match session {
        Some(session) => state.sessions.take_notices(&session.token).await?,
        None => Vec::new(),
    };
    Ok(PageView {
        page,
        notices,
        data,
    })
}

/// Queues the notices for the next page view and redirects there.
pub async fn redirect_with_notices(
    state: &AppState,
    session: &Session,
    notices: &[&str],
    to: &str,
) -> Result<Redirect, AppError> {
    for notice in notices {
        state.sessions.push_notice(&session.token, notice).await?;
    }
    Ok(Redirect::to(to))
}
