//! Per-route permission enforcement.
//!
//! Each guarded route names its required permission explicitly:
//!
//! ```ignore
//! .route(
//!     "/departments",
//!     get(departments::list).layer(middleware::from_fn_with_state(
//!         (state.clone(), "sys:dept:list"),
//!         permission::check,
//!     )),
//! )
//! ```
//!
//! Runs after the gate middleware, so an `AuthCtx` is already in the
//! request extensions for any `authc`-staged route.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::authz::AuthzError;
use crate::state::AppState;

pub async fn check(
    State((state, required)): State<(AppState, &'static str)>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req
        .extensions()
        .get::<AuthCtx>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    match state.realm.check_permission(&ctx.principal, required).await {
        Ok(()) => Ok(next.run(req).await),
        Err(AuthzError::Forbidden { required }) => {
            warn!(principal = %ctx.principal, required = %required, "permission denied");
            Err(AppError::Forbidden)
        }
        Err(AuthzError::Lookup(err)) => {
            // Could not determine permissions. Deny, but distinguishable
            // from Forbidden so callers and dashboards can tell them apart.
            warn!(principal = %ctx.principal, error = %err, "permission lookup failed");
            Err(AppError::Unavailable)
        }
    }
}
