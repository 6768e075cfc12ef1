//! Server-side sessions keyed by an opaque cookie token.
//!
//! The cookie carries only a random token; the identity (user id + role) and
//! any pending notices live in the session store.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::Role;

/// Authenticated caller, passed explicitly into every guarded operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Per-request session context produced by the guard extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub identity: Identity,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session and return its token.
    async fn create(&self, identity: Identity) -> Result<Session, AppError>;
    /// `None` for unknown or expired tokens.
    async fn load(&self, token: &str) -> Result<Option<Identity>, AppError>;
    async fn destroy(&self, token: &str) -> Result<(), AppError>;
    /// Queue a transient notice for the next page view.
    async fn push_notice(&self, token: &str, notice: &str) -> Result<(), AppError>;
    /// Drain every queued notice, oldest first.
    async fn take_notices(&self, token: &str) -> Result<Vec<String>, AppError>;
}

/// 32 random bytes, base64url without padding.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Find a cookie by name in the request headers.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// `secure` adds the `Secure` attribute; turn it on whenever the site is
/// served over HTTPS.
pub fn session_cookie(name: &str, token: &str, ttl_secs: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={token}; Path=/; HttpOnly{secure}; SameSite=Lax; Max-Age={ttl_secs}")
}

pub fn expired_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Redis-backed store. Keys expire with the session TTL.
///
/// Holds one managed connection that every call clones; the manager
/// reconnects on its own after a dropped connection.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, ttl_secs: u64) -> Self {
        Self { conn, ttl_secs }
    }

    fn identity_key(token: &str) -> String {
        format!("session:{token}")
    }

    fn notices_key(token: &str) -> String {
        format!("session:{token}:notices")
    }

    fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, identity: Identity) -> Result<Session, AppError> {
        let token = generate_session_token();
        let payload = serde_json::to_string(&identity)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("encode session: {e}")))?;

        let mut conn = self.connection();
        let _: () = redis::cmd("SET")
            .arg(Self::identity_key(&token))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await?;

        debug!("Created session for user {}", identity.user_id);
        Ok(Session { token, identity })
    }

    async fn load(&self, token: &str) -> Result<Option<Identity>, AppError> {
        let mut conn = self.connection();
        let payload: Option<String> = redis::cmd("GET")
            .arg(Self::identity_key(token))
            .query_async(&mut conn)
            .await?;

        match payload {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(identity) => Ok(Some(identity)),
                Err(e) => {
                    // Treat an unreadable record as no session at all.
                    tracing::warn!("Discarding malformed session record: {e}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn destroy(&self, token: &str) -> Result<(), AppError> {
        let mut conn = self.connection();
        let _: () = redis::cmd("DEL")
            .arg(Self::identity_key(token))
            .arg(Self::notices_key(token))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn push_notice(&self, token: &str, notice: &str) -> Result<(), AppError> {
        let key = Self::notices_key(token);
        let mut conn = self.connection();
        let _: () = redis::pipe()
            .atomic()
            .cmd("RPUSH")
            .arg(&key)
            .arg(notice)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn take_notices(&self, token: &str) -> Result<Vec<String>, AppError> {
        let key = Self::notices_key(token);
        let mut conn = self.connection();
        let (notices, _deleted): (Vec<String>, i64) = redis::pipe()
            .atomic()
            .cmd("LRANGE")
            .arg(&key)
            .arg(0)
            .arg(-1)
            .cmd("DEL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;
        Ok(notices)
    }
}

#[cfg(test)]
pub use memory::MemorySessionStore;
