//! Shared fixtures for in-process tests.

use std::sync::Arc;

use tempfile::TempDir;

use crate::auth::password::hash_password;
use crate::auth::session::{Identity, MemorySessionStore, Session};
use crate::config::Config;
use crate::intake::ResumeStorage;
use crate::models::user::{NewUser, Role, User};
use crate::state::AppState;
use crate::store::memory::MemoryStore;

/// State backed by in-memory stores and a temporary upload directory.
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn test_state() -> (AppState, TempDir) {
    let (state, _, dir) = test_state_with_store();
    (state, dir)
}

/// Like [`test_state`], also returning the concrete store for assertions.
pub fn test_state_with_store() -> (AppState, Arc<MemoryStore>, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let upload_dir = dir.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).expect("create upload dir");

    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        sessions: Arc::new(MemorySessionStore::new()),
        resumes: ResumeStorage::from_existing(upload_dir.clone()),
        config: Config::for_tests(upload_dir),
    };
    (state, store, dir)
}

pub async fn create_test_user(state: &AppState, username: &str, role: Role) -> User {
    let password_hash = hash_password("password", state.config.password_hashing).unwrap();
    state
        .store
        .insert_user(NewUser {
            username: username.to_string(),
            password_hash,
            role,
        })
        .await
        .unwrap()
}

/// Creates a user and a live session for it.
pub async fn login_as(state: &AppState, username: &str, role: Role) -> (User, Session) {
    let user = create_test_user(state, username, role).await;
    let session = state
        .sessions
        .create(Identity {
            user_id: user.id,
            role,
        })
        .await
        .unwrap();
    (user, session)
}
