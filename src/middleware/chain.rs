//! Ordered URL-pattern -> stage routing for the auth middleware.
//!
//! First match wins, so order is load-bearing: the ticket-callback and
//! logout entries must sit in front of the catch-all or they can never
//! match and ticket handling silently dies. That is a configuration error
//! class, so it is rejected when the chain is built at startup, not
//! discovered per request.

use thiserror::Error;

pub const CATCH_ALL: &str = "/**";

/// Security stage applied to a matched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Receive and validate a service ticket from the SSO server.
    TicketCallback,
    /// Terminate the local session and hand off to the SSO logout.
    Logout,
    /// No authentication required.
    Anon,
    /// Require an authenticated session.
    Authc,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::TicketCallback => "ticket-callback",
            Stage::Logout => "logout",
            Stage::Anon => "anon",
            Stage::Authc => "authc",
        }
    }
}

/// One ordered (pattern, stage) pair.
#[derive(Debug, Clone)]
pub struct FilterChainEntry {
    pub pattern: String,
    pub stage: Stage,
}

impl FilterChainEntry {
    pub fn new(pattern: impl Into<String>, stage: Stage) -> Self {
        Self {
            pattern: pattern.into(),
            stage,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("filter chain has no catch-all (`/**`) entry")]
    MissingCatchAll,

    #[error("entry `{shadowed}` is unreachable behind the catch-all at position {position}")]
    EntryBehindCatchAll { position: usize, shadowed: String },

    #[error("duplicate pattern `{0}`")]
    DuplicatePattern(String),

    #[error("filter chain has no `{0}` stage")]
    MissingStage(&'static str),
}

pub struct FilterChain {
    entries: Vec<FilterChainEntry>,
}

impl FilterChain {
    /// Build and validate a chain. Violated ordering invariants are fatal
    /// here so the process refuses to start with undefined routing.
    pub fn new(entries: Vec<FilterChainEntry>) -> Result<Self, ChainError> {
        let catch_all_position = entries
            .iter()
            .position(|e| e.pattern == CATCH_ALL)
            .ok_or(ChainError::MissingCatchAll)?;

        if let Some(shadowed) = entries.get(catch_all_position + 1) {
            return Err(ChainError::EntryBehindCatchAll {
                position: catch_all_position,
                shadowed: shadowed.pattern.clone(),
            });
        }

        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.pattern == entry.pattern) {
                return Err(ChainError::DuplicatePattern(entry.pattern.clone()));
            }
        }

        for (stage, name) in [
            (Stage::TicketCallback, Stage::TicketCallback.name()),
            (Stage::Logout, Stage::Logout.name()),
        ] {
            if !entries.iter().any(|e| e.stage == stage) {
                return Err(ChainError::MissingStage(name));
            }
        }

        Ok(Self { entries })
    }

    /// First matching entry decides the stage; `None` means no entry
    /// matched (unreachable when the chain carries its catch-all).
    pub fn resolve(&self, path: &str) -> Option<Stage> {
        self.entries
            .iter()
            .find(|e| pattern_matches(&e.pattern, path))
            .map(|e| e.stage)
    }

    pub fn entries(&self) -> &[FilterChainEntry] {
        &self.entries
    }
}

/// Exact match, `prefix/**` subtree match, or the `/**` catch-all.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == CATCH_ALL {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path == prefix || path.starts_with(&format!("{prefix}/"));
    }
    pattern == path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_entries() -> Vec<FilterChainEntry> {
        vec![
            FilterChainEntry::new("/sso/callback", Stage::TicketCallback),
            FilterChainEntry::new("/logout", Stage::Logout),
            FilterChainEntry::new("/health", Stage::Anon),
            FilterChainEntry::new(CATCH_ALL, Stage::Authc),
        ]
    }

    #[test]
    fn first_match_wins() {
        let chain = FilterChain::new(valid_entries()).unwrap();
        assert_eq!(chain.resolve("/sso/callback"), Some(Stage::TicketCallback));
        assert_eq!(chain.resolve("/logout"), Some(Stage::Logout));
        assert_eq!(chain.resolve("/health"), Some(Stage::Anon));
        assert_eq!(chain.resolve("/api/v1/me"), Some(Stage::Authc));
        assert_eq!(chain.resolve("/"), Some(Stage::Authc));
    }

    #[test]
    fn catch_all_before_logout_is_rejected() {
        let result = FilterChain::new(vec![
            FilterChainEntry::new("/sso/callback", Stage::TicketCallback),
            FilterChainEntry::new(CATCH_ALL, Stage::Authc),
            FilterChainEntry::new("/logout", Stage::Logout),
        ]);
        assert!(matches!(
            result,
            Err(ChainError::EntryBehindCatchAll { position: 1, .. })
        ));
    }

    #[test]
    fn missing_catch_all_is_rejected() {
        let result = FilterChain::new(vec![
            FilterChainEntry::new("/sso/callback", Stage::TicketCallback),
            FilterChainEntry::new("/logout", Stage::Logout),
        ]);
        assert!(matches!(result, Err(ChainError::MissingCatchAll)));
    }

    #[test]
    fn missing_ticket_callback_stage_is_rejected() {
        let result = FilterChain::new(vec![
            FilterChainEntry::new("/logout", Stage::Logout),
            FilterChainEntry::new(CATCH_ALL, Stage::Authc),
        ]);
        assert!(matches!(
            result,
            Err(ChainError::MissingStage("ticket-callback"))
        ));
    }

    #[test]
    fn duplicate_patterns_are_rejected() {
        let result = FilterChain::new(vec![
            FilterChainEntry::new("/sso/callback", Stage::TicketCallback),
            FilterChainEntry::new("/sso/callback", Stage::Anon),
            FilterChainEntry::new("/logout", Stage::Logout),
            FilterChainEntry::new(CATCH_ALL, Stage::Authc),
        ]);
        assert!(matches!(result, Err(ChainError::DuplicatePattern(_))));
    }

    #[test]
    fn subtree_patterns_match_their_prefix() {
        let chain = FilterChain::new(vec![
            FilterChainEntry::new("/sso/callback", Stage::TicketCallback),
            FilterChainEntry::new("/logout", Stage::Logout),
            FilterChainEntry::new("/public/**", Stage::Anon),
            FilterChainEntry::new(CATCH_ALL, Stage::Authc),
        ])
        .unwrap();

        assert_eq!(chain.resolve("/public"), Some(Stage::Anon));
        assert_eq!(chain.resolve("/public/docs/index.html"), Some(Stage::Anon));
        assert_eq!(chain.resolve("/publicity"), Some(Stage::Authc));
    }

    #[test]
    fn exact_match_does_not_cover_subpaths() {
        let chain = FilterChain::new(valid_entries()).unwrap();
        assert_eq!(chain.resolve("/logout/extra"), Some(Stage::Authc));
    }
}
