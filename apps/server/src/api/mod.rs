//! HTTP layer: router, extractors, handlers and middleware

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{auth::auth_middleware, state::AppState};

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let api = routes::api_routes().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(routes::session_routes(state.clone()))
        .nest("/api", api)
        .layer(axum_middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(RequestBodyLimitLayer::new(
            state.config.server.max_request_body_size,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Only the configured origins are allowed; an empty list disables CORS.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
