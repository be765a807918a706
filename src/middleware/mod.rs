pub mod auth;
pub mod chain;
pub mod cors;
pub mod http;
