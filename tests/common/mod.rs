use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::http::header;
use axum::response::Response;
use cas_gate::app;
use cas_gate::config::{AppEnv, Config, SessionBackend};
use cas_gate::services::authz::{LookupError, PermissionLookup, Realm};
use cas_gate::services::session::MemorySessionStore;
use cas_gate::services::sso::{
    Assertion, CasToken, Principal, SsoUrls, TicketGate, TicketValidator, ValidationError,
};
use cas_gate::state::AppState;

pub fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().expect("addr"),
        app_env: AppEnv::Development,
        sso_server_prefix: "https://sso.example.com/cas".parse().expect("prefix"),
        service_callback_url: "https://app.example.com/sso/callback".parse().expect("callback"),
        login_failure_url: "https://sso.example.com/cas/login?failed".parse().expect("failure"),
        logout_url: "https://sso.example.com/cas/logout".parse().expect("logout"),
        ticket_callback_path: "/sso/callback".to_string(),
        validation_timeout_seconds: 1,
        permission_refresh_seconds: 60,
        session_ttl_seconds: 3600,
        request_timeout_seconds: 5,
        session_backend: SessionBackend::Memory,
        valkey_url: None,
        default_roles: vec!["ROLE_USER".to_string()],
        static_permissions: vec!["sys:dept:list".to_string()],
        cors_allowed_origins: Vec::new(),
    }
}

/// What the scripted validator should do with a given ticket.
#[derive(Clone)]
pub enum Scripted {
    Accept(&'static str),
    Reject(&'static str),
    Unreachable,
    Hang,
}

/// Test double for the SSO server: responds per ticket and records calls.
pub struct ScriptedValidator {
    pub calls: AtomicUsize,
    pub seen_tickets: Mutex<Vec<String>>,
    script: HashMap<&'static str, Scripted>,
}

impl ScriptedValidator {
    pub fn new(script: impl IntoIterator<Item = (&'static str, Scripted)>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen_tickets: Mutex::new(Vec::new()),
            script: script.into_iter().collect(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TicketValidator for ScriptedValidator {
    fn validate<'a>(
        &'a self,
        token: &'a CasToken,
    ) -> Pin<Box<dyn Future<Output = Result<Assertion, ValidationError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ticket = token.ticket.value().to_string();
        self.seen_tickets.lock().expect("tickets").push(ticket.clone());

        let action = self
            .script
            .get(ticket.as_str())
            .cloned()
            .unwrap_or(Scripted::Reject("INVALID_TICKET"));

        Box::pin(async move {
            match action {
                Scripted::Accept(user) => Ok(Assertion {
                    principal: Principal::new(user),
                    attributes: HashMap::new(),
                }),
                Scripted::Reject(code) => Err(ValidationError::Rejected {
                    code: code.to_string(),
                    description: String::new(),
                }),
                Scripted::Unreachable => {
                    Err(ValidationError::Unreachable("connection refused".to_string()))
                }
                Scripted::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(ValidationError::Timeout)
                }
            }
        })
    }
}

/// Counting permission lookup; grants the same set to every principal or
/// fails when constructed as unavailable.
pub struct CountingLookup {
    pub calls: AtomicUsize,
    grants: Option<HashSet<String>>,
    delay: Duration,
}

impl CountingLookup {
    pub fn granting(perms: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            grants: Some(perms.iter().map(|s| s.to_string()).collect()),
            delay: Duration::ZERO,
        })
    }

    pub fn granting_slowly(perms: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            grants: Some(perms.iter().map(|s| s.to_string()).collect()),
            delay,
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            grants: None,
            delay: Duration::ZERO,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionLookup for CountingLookup {
    async fn lookup_permissions(
        &self,
        _principal: &Principal,
    ) -> Result<HashSet<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.grants {
            Some(grants) => Ok(grants.clone()),
            None => Err(LookupError::Unavailable("store offline".to_string())),
        }
    }
}

pub fn state_with(
    config: &Config,
    validator: Arc<dyn TicketValidator>,
    lookup: Arc<dyn PermissionLookup>,
) -> AppState {
    let urls = SsoUrls::new(config).expect("urls");
    let gate = Arc::new(TicketGate::new(
        validator,
        urls.clone(),
        Duration::from_millis(200),
    ));
    let realm = Arc::new(Realm::new(
        lookup,
        config.default_roles.iter().cloned(),
        Duration::from_secs(config.permission_refresh_seconds),
    ));

    AppState::new(
        gate,
        realm,
        Arc::new(MemorySessionStore::new()),
        Arc::new(app::default_chain(config).expect("chain")),
        urls,
        Duration::from_secs(config.session_ttl_seconds),
    )
}

pub fn router_with(
    config: &Config,
    validator: Arc<dyn TicketValidator>,
    lookup: Arc<dyn PermissionLookup>,
) -> Router {
    app::build_router(state_with(config, validator, lookup), config)
}

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("location utf-8")
        .to_string()
}

/// `gate_session=<id>` pair from the Set-Cookie header, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(|s| s.to_string())
}
