//! Service-ticket extraction from inbound requests.
//!
//! The SSO server hands the browser a one-time ticket on the callback
//! redirect (`?ticket=ST-...`). Non-browser clients may send the same value
//! as a `ticket` header instead. The parameter wins when both are present,
//! and an empty value counts as absent.

use axum::http::{HeaderMap, Uri};

/// Query parameter / header name carrying the service ticket.
pub const TICKET_PARAMETER: &str = "ticket";

/// Where the ticket was found on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketSource {
    Parameter,
    Header,
}

/// One-time service ticket as received. Opaque to us; only the SSO server
/// can judge it. Lives no longer than the request that carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    value: String,
    source: TicketSource,
}

impl Ticket {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> TicketSource {
        self.source
    }
}

/// Pure lookup, no side effects. Absence is a normal outcome, not an error.
pub fn extract_ticket(uri: &Uri, headers: &HeaderMap) -> Option<Ticket> {
    if let Some(value) = query_param(uri, TICKET_PARAMETER)
        && !value.is_empty()
    {
        return Some(Ticket {
            value,
            source: TicketSource::Parameter,
        });
    }

    headers
        .get(TICKET_PARAMETER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| Ticket {
            value: v.to_string(),
            source: TicketSource::Header,
        })
}

pub(crate) fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}
