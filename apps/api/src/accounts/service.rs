use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password, Argon2Params};
use crate::auth::session::{Identity, Session, SessionStore};
use crate::errors::AppError;
use crate::models::user::{NewUser, Role, User};
use crate::store::PlacementStore;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration policy knobs taken from `Config`.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationPolicy {
    pub allow_admin_signup: bool,
    pub hashing: Argon2Params,
}

/// Creates an account with the caller-chosen role. Does not log the user in.
///
/// Any caller may pick `admin` unless `allow_admin_signup` is off.
pub async fn register(
    store: &dyn PlacementStore,
    policy: RegistrationPolicy,
    form: RegisterForm,
) -> Result<User, AppError> {
    if form.username.trim().is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if form.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    let role: Role = form
        .role
        .parse()
        .map_err(|e| AppError::Validation(format!("{e}")))?;

    if role == Role::Admin && !policy.allow_admin_signup {
        return Err(AppError::Forbidden(
            "admin accounts cannot be self-registered".to_string(),
        ));
    }

    if store.find_user_by_username(&form.username).await?.is_some() {
        return Err(AppError::DuplicateUsername);
    }

    let password = form.password;
    let hashing = policy.hashing;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, hashing))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    let user = store
        .insert_user(NewUser {
            username: form.username,
            password_hash,
            role,
        })
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration of the same name.
            if e.is_unique_violation() {
                AppError::DuplicateUsername
            } else {
                AppError::Database(e)
            }
        })?;

    if role == Role::Admin {
        warn!("Self-registered admin account {} ({})", user.username, user.id);
    } else {
        info!("Registered {} account {} ({})", role, user.username, user.id);
    }
    Ok(user)
}

/// Verifies credentials and opens a server-side session.
///
/// Unknown usernames and wrong passwords yield the same error. A session the
/// caller already held is revoked once the new one is issued.
pub async fn login(
    store: &dyn PlacementStore,
    sessions: &dyn SessionStore,
    form: LoginForm,
    previous: Option<&Session>,
) -> Result<Session, AppError> {
    let Some(user) = store.find_user_by_username(&form.username).await? else {
        warn!("Failed login attempt");
        return Err(AppError::InvalidCredentials);
    };

    let password = form.password;
    let stored_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    if !verified {
        warn!("Failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    let session = sessions
        .create(Identity {
            user_id: user.id,
            role: user.role,
        })
        .await?;
    if let Some(previous) = previous {
        sessions.destroy(&previous.token).await?;
    }
    info!("User {} logged in as {}", user.id, user.role);
    Ok(session)
}

pub async fn logout(sessions: &dyn SessionStore, session: Option<&Session>) -> Result<(), AppError> {
    if let Some(session) = session {
        sessions.destroy(&session.token).await?;
        info!("User {} logged out", session.identity.user_id);
    }
    Ok(())
}
