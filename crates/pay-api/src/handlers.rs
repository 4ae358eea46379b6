//! # Request Handlers
//!
//! Axum request handlers for the payment API.

use crate::payments::MarkOrderPaid;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pay_core::{PaymentError, PaymentIntentRequest};
use pay_stripe::dispatch_webhook_event;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Header carrying the Stripe webhook signature
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Optional client header forwarded to Stripe as `Idempotency-Key`
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create payment intent response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    /// Secret for the client-side payment UI
    pub client_secret: String,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn payment_intent_error(err: PaymentError) -> ApiError {
    match err.status_code() {
        404 => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Order not found")),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(
                ErrorResponse::new("Failed to create payment intent")
                    .with_message(err.to_string()),
            ),
        ),
    }
}

/// 400 becomes the plain-text rejection, anything else a 500 JSON error
fn webhook_error(err: PaymentError) -> Response {
    match err.status_code() {
        400 => webhook_rejection(err),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Webhook handling failed").with_message(err.to_string())),
        )
            .into_response(),
    }
}

fn webhook_rejection(message: impl std::fmt::Display) -> Response {
    (
        StatusCode::BAD_REQUEST,
        format!("Webhook Error: {}", message),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "order-payments",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.strategy.provider_name(),
        "store": state.orders.backend_name(),
    }))
}

/// Create a payment intent for an existing order
#[instrument(skip(state, headers))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let order = state
        .orders
        .find_by_id(&order_id)
        .await
        .map_err(|e| {
            error!("Order lookup failed: {}", e);
            payment_intent_error(e)
        })?
        .ok_or_else(|| {
            payment_intent_error(PaymentError::OrderNotFound {
                order_id: order_id.clone(),
            })
        })?;

    let mut request = PaymentIntentRequest::for_order(&order, state.config.currency);

    if let Some(key) = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        request = request.with_idempotency_key(key);
    }

    info!(
        "Creating payment intent: order={}, amount={} {}",
        order.id, request.amount, request.currency
    );

    let intent = state
        .strategy
        .create_payment_intent(&request)
        .await
        .map_err(|e| {
            error!("Payment intent creation failed: {}", e);
            payment_intent_error(e)
        })?;

    info!("Payment intent created: {}", intent.id);

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Handle Stripe webhook
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, Response> {
    let Some(signature) = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        warn!("Webhook rejected: missing {} header", STRIPE_SIGNATURE_HEADER);
        return Err(webhook_rejection("Missing stripe-signature header"));
    };

    let event = state
        .strategy
        .verify_webhook(&body, signature)
        .await
        .map_err(|e| {
            error!("Webhook signature verification failed: {}", e);
            webhook_rejection(e)
        })?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    let handler = MarkOrderPaid::new(state.orders.clone());
    dispatch_webhook_event(&handler, event).await.map_err(|e| {
        error!(retryable = e.is_retryable(), "Webhook handler error: {}", e);
        webhook_error(e)
    })?;

    Ok(Json(WebhookAck { received: true }))
}
