/*!
 * Authorization: principal -> roles/permissions resolution.
 *
 * Public API:
 * - Realm / AuthorizationInfo / AuthzError
 * - PermissionLookup / StaticPermissionLookup / LookupError
 */

pub mod lookup;
pub mod realm;

pub use lookup::{LookupError, PermissionLookup, StaticPermissionLookup};
pub use realm::{AuthorizationInfo, AuthzError, Realm};
