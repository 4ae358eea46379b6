//! # pay-api
//!
//! HTTP API layer for order payments.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Payment intent creation for existing orders
//! - Stripe webhook handler that marks orders as paid
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/orders/{order_id}/create-payment-intent` | Create payment intent |
//! | POST | `/api/stripe-webhook` | Stripe webhook |

pub mod handlers;
pub mod payments;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState, LogFormat};
