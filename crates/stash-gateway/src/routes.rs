//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let login = Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state.login_limiter),
            middleware::rate_limit_middleware,
        ));

    let upload = Router::new()
        .route("/api/upload", post(handlers::upload_object))
        .layer(DefaultBodyLimit::max(state.config.upload_body_limit()));

    // Build the router
    let mut router = Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page))

        // Session endpoints
        .route("/api/auth/logout", post(handlers::logout))
        .merge(login)

        // Object endpoints
        .route("/api/list", get(handlers::list_objects))
        .merge(upload)
        .route("/api/download/{key}", get(handlers::download_object))
        .route("/api/download/", get(handlers::missing_key))
        .route("/api/delete/{key}", delete(handlers::delete_object))
        .route("/api/delete/", delete(handlers::missing_key))

        // Service endpoints
        .route("/api/status", get(handlers::backend_status));

    if let Some(dir) = &state.config.static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    let mut router = router
        .fallback(handlers::not_found)
        // Apply middleware
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ));

    // Preflights are answered here and never reach the auth gate
    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}
