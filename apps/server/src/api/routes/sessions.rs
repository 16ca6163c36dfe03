use crate::api::handlers::sessions;
use crate::auth::auth_middleware;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// `POST /sessions` is public; the user data lookup needs a token.
pub fn session_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::authenticate))
        .route(
            "/sessions/recover-user-data",
            get(sessions::recover_user_data)
                .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
}
