//! Permission lookup collaborator contract.
//!
//! The user/role store is external to this service (a directory, a database,
//! another service). The realm only needs one failure-capable operation.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::services::sso::validator::Principal;

#[derive(Debug, Error)]
pub enum LookupError {
    // Resolving permissions for an empty principal is a caller bug, not a
    // condition to retry.
    #[error("empty principal")]
    EmptyPrincipal,

    #[error("permission lookup unavailable: {0}")]
    Unavailable(String),
}

/// Implementations must be safe to call concurrently; the realm coalesces
/// lookups per principal but different principals resolve in parallel.
#[async_trait]
pub trait PermissionLookup: Send + Sync {
    async fn lookup_permissions(
        &self,
        principal: &Principal,
    ) -> Result<HashSet<String>, LookupError>;
}

/// Config-driven lookup granting the same permission set to every
/// authenticated principal. Stands in until a real user/role store is wired
/// behind the trait.
pub struct StaticPermissionLookup {
    permissions: HashSet<String>,
}

impl StaticPermissionLookup {
    pub fn new(permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            permissions: permissions.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PermissionLookup for StaticPermissionLookup {
    async fn lookup_permissions(
        &self,
        _principal: &Principal,
    ) -> Result<HashSet<String>, LookupError> {
        Ok(self.permissions.clone())
    }
}
