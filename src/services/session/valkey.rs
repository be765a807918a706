//! Valkey/Redis-backed session store.
//!
//! Sessions are stored as JSON under `session:<id>` with the TTL applied by
//! the server (`SET ... EX`), so expiry needs no sweeper here either.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::services::session::store::{Session, SessionError, SessionResult, SessionStore};

#[derive(Clone)]
pub struct ValkeySessionStore {
    manager: redis::aio::ConnectionManager,
}

impl ValkeySessionStore {
    // Create a store from a URL like `redis://localhost:6379`
    pub async fn new(url: &str) -> SessionResult<Self> {
        let client =
            redis::Client::open(url).map_err(|e| SessionError::Backend(e.to_string()))?;

        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(Self { manager })
    }

    fn key(id: Uuid) -> String {
        format!("session:{id}")
    }
}

#[async_trait]
impl SessionStore for ValkeySessionStore {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get(&self, id: Uuid) -> SessionResult<Option<Session>> {
        // Use a clone of the connection manager
        let mut conn = self.manager.clone();

        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| SessionError::Codec(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(&self, session: &Session, ttl: Duration) -> SessionResult<()> {
        let mut conn = self.manager.clone();

        let json =
            serde_json::to_string(session).map_err(|e| SessionError::Codec(e.to_string()))?;

        // EX expects integer seconds; clamp to at least 1.
        let ttl_seconds: u64 = ttl.as_secs().max(1);

        redis::cmd("SET")
            .arg(Self::key(session.id))
            .arg(json)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> SessionResult<()> {
        let mut conn = self.manager.clone();

        redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async::<u64>(&mut conn)
            .await
            .map_err(|e| SessionError::Backend(e.to_string()))?;

        Ok(())
    }
}
