//! Chain-driven authentication middleware.
//!
//! Resolves the filter-chain stage for each request and applies it: ticket
//! callback and logout are terminal (the router never sees them, mirroring
//! how the chain owns those paths), `authc` requires a live session, `anon`
//! passes through. The gate itself only detects; this middleware owns the
//! redirect policy for denied requests.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::chain::Stage;
use crate::services::session::Session;
use crate::services::sso::gate::GateOutcome;
use crate::services::sso::ticket::query_param;
use crate::services::sso::urls::{REDIRECT_PARAMETER, safe_redirect_target};
use crate::state::AppState;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "gate_session";

/// Apply the authentication chain to every route of the given router.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、
    // from_fn_with_state で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, gate_middleware))
}

async fn gate_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // Preflight requests cannot follow redirects; let them through before
    // any stage dispatch.
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    match state.chain.resolve(req.uri().path()) {
        Some(Stage::TicketCallback) => handle_ticket_callback(&state, req, next).await,
        Some(Stage::Logout) => handle_logout(&state, req).await,
        Some(Stage::Authc) => handle_authc(&state, req, next).await,
        Some(Stage::Anon) => next.run(req).await,
        None => {
            // Unreachable with a validated chain (the catch-all matches
            // everything), but never turn a routing hole into a lockout.
            debug!(path = req.uri().path(), "no filter chain entry matched");
            next.run(req).await
        }
    }
}

/// Terminal stage: validate the ticket the SSO server redirected to us,
/// bind the principal to a fresh session and send the browser back to
/// where it was headed. Denials bounce to the login-failure URL.
async fn handle_ticket_callback(state: &AppState, mut req: Request<Body>, next: Next) -> Response {
    // One validation attempt per request: a ticket that was already denied
    // here is not retried (single-use semantics live on the SSO server, but
    // re-submitting a burned ticket is pointless extra load).
    let outcome = match req.extensions().get::<GateOutcome>() {
        Some(prior) => prior.clone(),
        None => {
            let outcome = state
                .gate
                .authenticate(req.method(), req.uri(), req.headers())
                .await;
            req.extensions_mut().insert(outcome.clone());
            outcome
        }
    };

    match outcome {
        GateOutcome::Bypassed => next.run(req).await,
        GateOutcome::Authenticated(assertion) => {
            let session = Session::new(assertion.principal.clone(), assertion.attributes);
            if let Err(err) = state.sessions.put(&session, state.session_ttl).await {
                // A single-use ticket was just consumed; redirecting back to
                // login cannot recover this, so fail loudly.
                warn!(
                    error = %err,
                    backend = state.sessions.backend_name(),
                    "failed to persist session after ticket validation"
                );
                return AppError::Internal.into_response();
            }

            info!(principal = %assertion.principal, session = %session.id, "authenticated via sso ticket");

            let redirect = query_param(req.uri(), REDIRECT_PARAMETER);
            let target = redirect
                .as_deref()
                .and_then(safe_redirect_target)
                .unwrap_or("/");

            (
                [(header::SET_COOKIE, session_cookie(session.id, state.session_ttl.as_secs()))],
                Redirect::to(target),
            )
                .into_response()
        }
        GateOutcome::Denied(err) => {
            warn!(kind = err.kind(), error = %err, "ticket authentication denied");
            Redirect::to(state.urls.login_failure().as_str()).into_response()
        }
    }
}

/// Terminal stage: drop the session and its cached authorization info, then
/// hand the browser to the SSO logout endpoint.
async fn handle_logout(state: &AppState, req: Request<Body>) -> Response {
    if let Some(session_id) = session_id_from_cookie(req.headers()) {
        match state.sessions.get(session_id).await {
            Ok(Some(session)) => {
                state.realm.invalidate(&session.principal);
                if let Err(err) = state.sessions.delete(session_id).await {
                    warn!(error = %err, "failed to delete session on logout");
                }
                info!(principal = %session.principal, "logged out");
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "session lookup failed during logout");
            }
        }
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to(state.urls.logout().as_str()),
    )
        .into_response()
}

/// Require a live session; otherwise send the browser to the SSO login with
/// this URL preserved for the post-login return trip.
async fn handle_authc(state: &AppState, mut req: Request<Body>, next: Next) -> Response {
    if let Some(session_id) = session_id_from_cookie(req.headers()) {
        match state.sessions.get(session_id).await {
            Ok(Some(session)) => {
                // middleware → extractor への受け渡し
                req.extensions_mut()
                    .insert(AuthCtx::new(session.principal, session.attributes));
                return next.run(req).await;
            }
            Ok(None) => {
                debug!("session cookie did not resolve, forcing re-login");
            }
            Err(err) => {
                // Fail closed: an unreadable session backend means re-login,
                // never a silent pass.
                warn!(
                    error = %err,
                    backend = state.sessions.backend_name(),
                    "session backend failure, forcing re-login"
                );
            }
        }
    }

    let original = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let login = state.urls.login_redirect(Some(&original));
    Redirect::to(login.as_str()).into_response()
}

fn session_cookie(id: Uuid, max_age_seconds: u64) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn session_id_from_cookie(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}
