//! Ticket validation contract against the SSO server.
//!
//! The wire protocol stays behind [`TicketValidator`]; the gate only needs
//! success/failure plus the verified principal. See `rest.rs` for the HTTP
//! implementation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::services::sso::ticket::Ticket;

/// Verified identity returned by the SSO server. Owned by the session once
/// authentication succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One validation attempt: the extracted ticket plus the exact service URL
/// it was issued for. Immutable; discarded after the attempt.
#[derive(Debug, Clone)]
pub struct CasToken {
    pub ticket: Ticket,
    pub service: Url,
}

impl CasToken {
    pub fn new(ticket: Ticket, service: Url) -> Self {
        Self { ticket, service }
    }
}

/// What the SSO server asserted about a validated ticket.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub principal: Principal,
    pub attributes: HashMap<String, serde_json::Value>,
}

/// Validation failures, kept apart so logs/metrics can tell a rejected
/// ticket from an SSO server that never answered.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("ticket rejected by sso server ({code}): {description}")]
    Rejected { code: String, description: String },

    #[error("ticket validation timed out")]
    Timeout,

    #[error("sso server unreachable: {0}")]
    Unreachable(String),

    #[error("malformed sso response: {0}")]
    Malformed(String),
}

/// Validates a one-time service ticket with the SSO server.
///
/// Implementations must be cheap to share (`Arc`) and safe to call
/// concurrently. The call is a network operation; the gate bounds it with a
/// timeout and drops the future on request abort.
pub trait TicketValidator: Send + Sync {
    fn validate<'a>(
        &'a self,
        token: &'a CasToken,
    ) -> Pin<Box<dyn Future<Output = Result<Assertion, ValidationError>> + Send + 'a>>;
}
