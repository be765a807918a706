//! Authorization realm: authenticated principal -> roles + permissions.
//!
//! Resolution calls the lookup collaborator and caches the result per
//! principal inside a freshness window (`refresh`); `refresh == 0` means
//! every check recomputes. Either way, recomputation for one principal is
//! guarded by a per-principal async mutex so concurrent checks trigger at
//! most one in-flight lookup instead of stampeding the collaborator.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::services::authz::lookup::{LookupError, PermissionLookup};
use crate::services::sso::validator::Principal;

/// Role and permission sets for one principal. Immutable once built; the
/// realm replaces the whole value on recomputation, never patches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationInfo {
    roles: HashSet<String>,
    permissions: HashSet<String>,
}

impl AuthorizationInfo {
    pub fn new(roles: HashSet<String>, permissions: HashSet<String>) -> Self {
        Self { roles, permissions }
    }

    pub fn roles(&self) -> &HashSet<String> {
        &self.roles
    }

    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Whether any granted permission implies `required` under
    /// colon-delimited wildcard matching.
    pub fn implies(&self, required: &str) -> bool {
        if self.permissions.contains(required) {
            return true;
        }
        self.permissions
            .iter()
            .any(|granted| permission_implies(granted, required))
    }
}

/// Colon-delimited wildcard implication: `*` matches any part, a granted
/// permission with fewer parts implies all its extensions, and extra
/// granted parts beyond the required length must all be `*`.
fn permission_implies(granted: &str, required: &str) -> bool {
    let granted_parts: Vec<&str> = granted.split(':').collect();
    let required_parts: Vec<&str> = required.split(':').collect();

    for (i, required_part) in required_parts.iter().enumerate() {
        match granted_parts.get(i) {
            None => return true,
            Some(&"*") => {}
            Some(granted_part) if granted_part == required_part => {}
            Some(_) => return false,
        }
    }

    granted_parts[required_parts.len()..]
        .iter()
        .all(|part| *part == "*")
}

/// Authorization-time failures, kept distinct so callers can tell "lacks
/// permission" from "could not determine permissions".
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("permission denied: {required}")]
    Forbidden { required: String },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

struct CachedInfo {
    info: Arc<AuthorizationInfo>,
    fetched_at: Instant,
}

#[derive(Default)]
struct Slot(Mutex<Option<CachedInfo>>);

pub struct Realm {
    lookup: Arc<dyn PermissionLookup>,
    default_roles: HashSet<String>,
    refresh: Duration,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl Realm {
    pub fn new(
        lookup: Arc<dyn PermissionLookup>,
        default_roles: impl IntoIterator<Item = String>,
        refresh: Duration,
    ) -> Self {
        Self {
            lookup,
            default_roles: default_roles.into_iter().collect(),
            refresh,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the authorization info for `principal`, recomputing through
    /// the lookup collaborator when the cached value is missing or stale.
    /// Failures propagate; no default set is fabricated.
    pub async fn resolve(
        &self,
        principal: &Principal,
    ) -> Result<Arc<AuthorizationInfo>, LookupError> {
        if principal.name().is_empty() {
            return Err(LookupError::EmptyPrincipal);
        }

        let slot = self.slot(principal.name());

        // Per-principal mutex: concurrent checks for one principal queue
        // here and reuse the value the first one fetched.
        let mut guard = slot.0.lock().await;

        if self.refresh > Duration::ZERO
            && let Some(cached) = guard.as_ref()
            && cached.fetched_at.elapsed() < self.refresh
        {
            return Ok(cached.info.clone());
        }

        let permissions = self.lookup.lookup_permissions(principal).await?;
        debug!(principal = %principal, count = permissions.len(), "permissions resolved");

        // Wholesale replacement; a reader holding the previous Arc keeps a
        // consistent snapshot.
        let info = Arc::new(AuthorizationInfo::new(
            self.default_roles.clone(),
            permissions,
        ));
        *guard = Some(CachedInfo {
            info: info.clone(),
            fetched_at: Instant::now(),
        });

        Ok(info)
    }

    /// Authorization check for a single permission string.
    pub async fn check_permission(
        &self,
        principal: &Principal,
        required: &str,
    ) -> Result<(), AuthzError> {
        let info = self.resolve(principal).await?;
        if info.implies(required) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden {
                required: required.to_string(),
            })
        }
    }

    /// Drop the cached info for a principal (logout).
    pub fn invalidate(&self, principal: &Principal) {
        self.slots
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(principal.name());
    }

    fn slot(&self, name: &str) -> Arc<Slot> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(name)
        {
            return slot.clone();
        }

        self.slots
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}
