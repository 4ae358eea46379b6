//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - POST /api/orders/{order_id}/create-payment-intent - Create payment intent
/// - POST /api/stripe-webhook - Stripe webhook handler (raw body, no CORS)
/// - GET  /health, GET / - Health check
pub fn create_router(state: AppState) -> Router {
    // Called from the storefront's browser checkout
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let order_routes = Router::new()
        .route(
            "/api/orders/{order_id}/create-payment-intent",
            post(handlers::create_payment_intent),
        )
        .layer(cors);

    // Signature is computed over the exact bytes, so no body-transforming layers here
    let webhook_routes = Router::new().route("/api/stripe-webhook", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .merge(order_routes)
        .merge(webhook_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
