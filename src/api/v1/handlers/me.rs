use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::state::AppState;

/// Who the session belongs to, with the roles/permissions the realm
/// currently resolves for them.
pub async fn show(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<MeResponse>, AppError> {
    let info = state.realm.resolve(&ctx.principal).await.map_err(|err| {
        warn!(principal = %ctx.principal, error = %err, "authorization info unavailable");
        AppError::Unavailable
    })?;

    let mut roles: Vec<String> = info.roles().iter().cloned().collect();
    roles.sort();
    let mut permissions: Vec<String> = info.permissions().iter().cloned().collect();
    permissions.sort();

    Ok(Json(MeResponse {
        username: ctx.principal.name().to_string(),
        roles,
        permissions,
    }))
}
