/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::chain::FilterChain;
use crate::services::authz::Realm;
use crate::services::session::SessionStore;
use crate::services::sso::{SsoUrls, TicketGate};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<TicketGate>,
    pub realm: Arc<Realm>,
    pub sessions: Arc<dyn SessionStore>,
    pub chain: Arc<FilterChain>,
    pub urls: SsoUrls,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(
        gate: Arc<TicketGate>,
        realm: Arc<Realm>,
        sessions: Arc<dyn SessionStore>,
        chain: Arc<FilterChain>,
        urls: SsoUrls,
        session_ttl: Duration,
    ) -> Self {
        Self {
            gate,
            realm,
            sessions,
            chain,
            urls,
            session_ttl,
        }
    }
}
