//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, plans, proration, subscriptions};
use crate::state::AppState;

/// Maximum concurrent requests for `/v1` endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Catalog and proration (Service API Key auth)
/// - `GET /v1/plans` - List plans and prices
/// - `POST /v1/proration/preview` - Prorate an explicit period
///
/// ## Subscriptions (Service API Key auth)
/// - `POST /v1/subscriptions` - Activate a subscription
/// - `GET /v1/subscriptions/:subscriber_id` - Current period
/// - `GET /v1/subscriptions/:subscriber_id/periods` - Period history
/// - `POST /v1/subscriptions/:subscriber_id/change/preview` - Preview a plan change
/// - `POST /v1/subscriptions/:subscriber_id/change` - Change plan now
/// - `POST /v1/subscriptions/:subscriber_id/renew` - Start the next period
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let subscription_routes = Router::new()
        .route("/", post(subscriptions::activate_subscription))
        .route("/:subscriber_id", get(subscriptions::get_subscription))
        .route("/:subscriber_id/periods", get(subscriptions::list_periods))
        .route(
            "/:subscriber_id/change/preview",
            post(subscriptions::preview_change),
        )
        .route("/:subscriber_id/change", post(subscriptions::change_plan))
        .route(
            "/:subscriber_id/renew",
            post(subscriptions::renew_subscription),
        );

    let api_routes = Router::new()
        .route("/plans", get(plans::list_plans))
        .route("/proration/preview", post(proration::preview_proration))
        .nest("/subscriptions", subscription_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
