//! Per-request authentication state machine.
//!
//! `UNCHECKED -> EXTRACTING -> VALIDATING -> {AUTHENTICATED, DENIED}`
//!
//! The gate only decides; it never redirects. The auth middleware owns the
//! redirect policy (where a denied browser is sent), which keeps detection
//! and policy separable.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, Method, Uri};
use tracing::debug;

use crate::services::sso::ticket::{self, Ticket};
use crate::services::sso::urls::{REDIRECT_PARAMETER, SsoUrls, safe_redirect_target};
use crate::services::sso::validator::{Assertion, CasToken, TicketValidator, ValidationError};

/// Authentication failures. All of them resolve into a DENIED outcome; the
/// `kind` string keeps them apart in logs and metrics.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("no ticket on request")]
    TicketAbsent,

    #[error("ticket rejected by sso server ({code})")]
    TicketInvalid { code: String },

    #[error("ticket validation timed out")]
    ValidationTimeout,

    #[error("sso server unreachable: {0}")]
    ValidationUnreachable(String),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::TicketAbsent => "ticket_absent",
            AuthError::TicketInvalid { .. } => "ticket_invalid",
            AuthError::ValidationTimeout => "validation_timeout",
            AuthError::ValidationUnreachable(_) => "validation_unreachable",
        }
    }
}

/// Filter states, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unchecked,
    Extracting,
    Validating,
    Authenticated,
    Denied,
}

/// Result of one gate evaluation.
#[derive(Debug, Clone)]
pub enum GateOutcome {
    /// Preflight bypass; no authentication attempted.
    Bypassed,
    Authenticated(Assertion),
    Denied(AuthError),
}

pub struct TicketGate {
    validator: Arc<dyn TicketValidator>,
    urls: SsoUrls,
    validation_timeout: Duration,
}

impl TicketGate {
    pub fn new(
        validator: Arc<dyn TicketValidator>,
        urls: SsoUrls,
        validation_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            urls,
            validation_timeout,
        }
    }

    /// Preflight requests are side-effect free and browsers cannot follow a
    /// redirect answer to them, so they always pass.
    pub fn is_access_allowed(&self, method: &Method) -> bool {
        *method == Method::OPTIONS
    }

    /// Walk the state machine once for this request. Ticket-less requests
    /// are denied without ever contacting the SSO server.
    pub async fn authenticate(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> GateOutcome {
        let mut state = GateState::Unchecked;

        if self.is_access_allowed(method) {
            debug!(?state, "preflight bypass");
            return GateOutcome::Bypassed;
        }

        state = GateState::Extracting;
        let Some(ticket) = ticket::extract_ticket(uri, headers) else {
            debug!(?state, "no ticket on request, denying without validation");
            return GateOutcome::Denied(AuthError::TicketAbsent);
        };

        state = GateState::Validating;
        debug!(?state, source = ?ticket.source(), "validating service ticket");
        match self.validate(ticket, uri).await {
            Ok(assertion) => {
                state = GateState::Authenticated;
                debug!(?state, principal = %assertion.principal, "ticket validated");
                GateOutcome::Authenticated(assertion)
            }
            Err(err) => {
                state = GateState::Denied;
                debug!(?state, kind = err.kind(), "ticket validation failed");
                GateOutcome::Denied(err)
            }
        }
    }

    async fn validate(&self, ticket: Ticket, uri: &Uri) -> Result<Assertion, AuthError> {
        // The service URL must round-trip exactly as issued at login time,
        // including the preserved-redirect parameter.
        let redirect = ticket::query_param(uri, REDIRECT_PARAMETER);
        let redirect = redirect.as_deref().and_then(safe_redirect_target);
        let token = CasToken::new(ticket, self.urls.service_url(redirect));

        // Bound the network call; an overdue validation is a denial, not a
        // pending request. Dropping the future also abandons the call when
        // the client goes away.
        match tokio::time::timeout(self.validation_timeout, self.validator.validate(&token)).await
        {
            Ok(Ok(assertion)) => Ok(assertion),
            Ok(Err(ValidationError::Rejected { code, .. })) => {
                Err(AuthError::TicketInvalid { code })
            }
            Ok(Err(ValidationError::Timeout)) => Err(AuthError::ValidationTimeout),
            Ok(Err(ValidationError::Unreachable(reason))) => {
                Err(AuthError::ValidationUnreachable(reason))
            }
            Ok(Err(ValidationError::Malformed(reason))) => {
                Err(AuthError::ValidationUnreachable(reason))
            }
            Err(_) => Err(AuthError::ValidationTimeout),
        }
    }
}
