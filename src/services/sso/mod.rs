/*!
 * SSO integration: ticket extraction, validation, and the per-request
 * authentication gate.
 *
 * Public API:
 * - extract_ticket / Ticket
 * - TicketValidator / RestTicketValidator
 * - TicketGate / GateOutcome / AuthError
 * - SsoUrls
 */

pub mod gate;
pub mod rest;
pub mod ticket;
pub mod urls;
pub mod validator;

pub use gate::{AuthError, GateOutcome, TicketGate};
pub use rest::RestTicketValidator;
pub use ticket::{Ticket, TicketSource, extract_ticket};
pub use urls::SsoUrls;
pub use validator::{Assertion, CasToken, Principal, TicketValidator, ValidationError};
