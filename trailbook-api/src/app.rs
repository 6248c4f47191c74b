/// Application state and router builder
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                       # health check (public)
/// └── /api/v1/
///     ├── /tours/                   # catalog (reads public, writes staff)
///     │   └── /:id/reviews/         # nested review routes
///     ├── /users/                   # auth flows + account management
///     ├── /reviews/                 # authenticated review CRUD
///     └── /bookings/                # checkout + admin CRUD
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first): security headers, compression, CORS,
/// request tracing. Authentication and role gates are layered per route
/// group inside the route modules.

use axum::{routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config, mail::Mailer, middleware::security::SecurityHeadersLayer,
    payments::CheckoutClient, routes,
};

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; everything inside is an
/// `Arc` or a pool handle, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail transport
    pub mailer: Arc<dyn Mailer>,

    /// Checkout provider client
    pub payments: Arc<CheckoutClient>,
}

impl AppState {
    /// Creates new application state with the given transports
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let payments = Arc::new(CheckoutClient::new(config.payments.clone()));
        Self {
            db,
            config: Arc::new(config),
            mailer,
            payments,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/tours", routes::tours::router(state.clone()))
        .nest("/users", routes::users::router(state.clone()))
        .nest("/reviews", routes::reviews::router(state.clone()))
        .nest("/bookings", routes::bookings::router(state.clone()));

    let cors = build_cors(&state.config.api.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api)
        .fallback(routes::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
