//! In-process session store. Single-node only; use the Valkey store when
//! running more than one instance behind the SSO callback.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::services::session::store::{Session, SessionResult, SessionStore};

#[derive(Default)]
pub struct MemorySessionStore {
    // Deadline stored next to the session; expired entries are dropped on
    // access rather than swept.
    inner: Mutex<HashMap<Uuid, (Session, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: Uuid) -> SessionResult<Option<Session>> {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match inner.get(&id) {
            Some((_, deadline)) if *deadline <= Instant::now() => {
                inner.remove(&id);
                Ok(None)
            }
            Some((session, _)) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, session: &Session, ttl: Duration) -> SessionResult<()> {
        let deadline = Instant::now() + ttl;
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(session.id, (session.clone(), deadline));
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> SessionResult<()> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sso::validator::Principal;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemorySessionStore::new();
        let session = Session::new(Principal::new("alice"), HashMap::new());

        store.put(&session, Duration::from_secs(60)).await.unwrap();
        let loaded = store.get(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.principal, Principal::new("alice"));

        store.delete(session.id).await.unwrap();
        assert!(store.get(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_not_returned() {
        let store = MemorySessionStore::new();
        let session = Session::new(Principal::new("bob"), HashMap::new());

        store.put(&session, Duration::from_secs(0)).await.unwrap();
        assert!(store.get(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
