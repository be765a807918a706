//! Session store interface used by the auth middleware.
//!
//! Intentionally small and id-keyed: the gate only needs get/put-with-ttl/
//! delete. Whether sessions live in process memory or in a shared Valkey is
//! a deployment choice, not a core concern.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::services::sso::validator::Principal;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Store-layer errors (transport/serialization). Kept independent from
/// `AppError` so callers decide how to fail (the authc stage fails closed by
/// forcing a re-login).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Backend(String),
    #[error("session codec error: {0}")]
    Codec(String),
}

/// An authenticated session: the verified principal plus the attributes the
/// SSO server asserted at validation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub principal: Principal,
    pub attributes: HashMap<String, serde_json::Value>,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(principal: Principal, attributes: HashMap<String, serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal,
            attributes,
            issued_at: Utc::now(),
        }
    }
}

/// Implementations must be safe to share across concurrent requests
/// (typically `Arc<...>` inside).
#[async_trait]
pub trait SessionStore: Send + Sync {
    // Returns the backend name (for logging/metrics).
    fn backend_name(&self) -> &'static str;

    async fn get(&self, id: Uuid) -> SessionResult<Option<Session>>;

    // Store or replace a session with a TTL.
    async fn put(&self, session: &Session, ttl: Duration) -> SessionResult<()>;

    async fn delete(&self, id: Uuid) -> SessionResult<()>;
}
