/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (filter chain / CORS / HTTP)
 * - axum::serve() で起動
 */
use std::sync::Arc;
use std::time::Duration;
use std::{panic, process};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, SessionBackend};
use crate::middleware::auth::gate;
use crate::middleware::chain::{CATCH_ALL, ChainError, FilterChain, FilterChainEntry, Stage};
use crate::middleware::{cors, http};
use crate::services::authz::{Realm, StaticPermissionLookup};
use crate::services::session::{MemorySessionStore, SessionStore, ValkeySessionStore};
use crate::services::sso::{RestTicketValidator, SsoUrls, TicketGate};
use crate::state::AppState;

/// Local path the logout stage owns.
const LOGOUT_PATH: &str = "/logout";

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,cas_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost"
        // (stderr can be hidden depending on how the process is launched.)
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        // In production, prefer the default behavior (stderr) and let the server keep running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting sso gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)
        .await
        .context("building application state")?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .context("binding listener")?;
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}

/// The ordered filter chain. Startup fails here when the ordering
/// invariants are violated rather than routing requests into a hole.
pub fn default_chain(config: &Config) -> Result<FilterChain, ChainError> {
    FilterChain::new(vec![
        FilterChainEntry::new(config.ticket_callback_path.clone(), Stage::TicketCallback),
        FilterChainEntry::new(LOGOUT_PATH, Stage::Logout),
        FilterChainEntry::new("/health", Stage::Anon),
        FilterChainEntry::new(CATCH_ALL, Stage::Authc),
    ])
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let urls = SsoUrls::new(config)?;

    let validation_timeout = Duration::from_secs(config.validation_timeout_seconds);
    let validator = RestTicketValidator::new(&config.sso_server_prefix, validation_timeout)
        .context("building ticket validator")?;
    let ticket_gate = Arc::new(TicketGate::new(
        Arc::new(validator),
        urls.clone(),
        validation_timeout,
    ));

    let realm = Arc::new(Realm::new(
        Arc::new(StaticPermissionLookup::new(
            config.static_permissions.iter().cloned(),
        )),
        config.default_roles.iter().cloned(),
        Duration::from_secs(config.permission_refresh_seconds),
    ));

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Valkey => {
            // Presence of VALKEY_URL was validated with the rest of the config.
            let url = config
                .valkey_url
                .as_deref()
                .context("VALKEY_URL not configured")?;
            Arc::new(
                ValkeySessionStore::new(url)
                    .await
                    .context("connecting to valkey")?,
            )
        }
    };

    let chain = Arc::new(default_chain(config).context("validating filter chain")?);

    Ok(AppState::new(
        ticket_gate,
        realm,
        sessions,
        chain,
        urls,
        Duration::from_secs(config.session_ttl_seconds),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    async fn index() -> &'static str {
        "ok"
    }
    async fn health() -> &'static str {
        "ok"
    }

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()));

    // Innermost first: the auth chain guards the routes, CORS wraps it so
    // preflight answers carry the right headers, transport concerns outermost.
    let router = gate::apply(router, state.clone()).with_state(state);
    let router = cors::apply(router, config);
    http::apply(router, config)
}
