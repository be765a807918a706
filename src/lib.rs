//! SSO ticket gate: redirects unauthenticated callers to a central CAS-style
//! SSO server, exchanges the returned one-time service ticket for a verified
//! principal, and enforces per-route permissions through an authorization
//! realm.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
