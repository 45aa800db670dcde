use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::auth;
use crate::handlers::{flipbook_url, health_check, method_not_allowed};
use crate::AppState;

pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Login routes
        .route("/login", post(auth::login).fallback(method_not_allowed))
        .route(
            "/google-auth",
            post(auth::google_auth).fallback(method_not_allowed),
        )
        .route(
            "/check-email",
            post(auth::check_email)
                .get(auth::allowlist_summary)
                .fallback(method_not_allowed),
        )
        // Bearer-protected routes
        .route(
            "/flipbook-url",
            get(flipbook_url)
                .route_layer(from_fn_with_state(state.clone(), auth::require_auth))
                .fallback(method_not_allowed),
        )
        .route(
            "/verify",
            get(auth::verify)
                .route_layer(from_fn_with_state(state.clone(), auth::require_auth))
                .fallback(method_not_allowed),
        )
}

/// Build the complete application: API routes, CORS, tracing and the
/// optional static frontend.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_allowed_origins.as_deref());
    let frontend_dir = state.config.frontend_dir.clone();

    let app = Router::new()
        .route("/health", get(health_check).fallback(method_not_allowed))
        .nest("/api", api_routes(&state));

    // Serve static frontend files if the directory exists
    let app = if std::path::Path::new(&frontend_dir).exists() {
        tracing::info!("Serving frontend from {}", frontend_dir);
        let index_path = format!("{}/index.html", frontend_dir);
        let serve_dir = ServeDir::new(&frontend_dir).not_found_service(ServeFile::new(&index_path));
        app.fallback_service(serve_dir)
    } else {
        tracing::info!(
            "Frontend directory not found at {}, serving API only",
            frontend_dir
        );
        app
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
    .with_state(state)
}

/// Build CORS layer from configuration.
///
/// If origins are configured, only those are allowed; otherwise any origin.
/// `OPTIONS` requests on every path are answered by this layer with 200 and
/// an empty body.
fn build_cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        if allowed_origins.is_some() {
            tracing::warn!("CORS_ALLOWED_ORIGINS has no valid origins, allowing any origin");
        }
        layer.allow_origin(Any)
    } else {
        tracing::info!("CORS configured for origins: {:?}", origins);
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
