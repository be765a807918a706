use axum::{Router, middleware, routing::get};

use crate::api::v1::handlers::{departments, me};
use crate::middleware::auth::permission;
use crate::state::AppState;

/// `/api/v1` routes. Guarded routes name their required permission here,
/// right next to the handler they protect.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(me::show))
        .route(
            "/departments",
            get(departments::list).layer(middleware::from_fn_with_state(
                (state, "sys:dept:list"),
                permission::check,
            )),
        )
}
