//! # Stripe Webhook Handling
//!
//! Utilities for handling Stripe webhooks.
//! Webhooks notify your server of payment intent outcomes.

use async_trait::async_trait;
use pay_core::{
    Currency, PaymentError, PaymentResult, WebhookEvent, WebhookEventType, METADATA_ORDER_ID,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Parsed payment_intent.* event data
#[derive(Debug, Clone)]
pub struct PaymentIntentData {
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub status: String,
    /// Message of the last failed attempt, if any
    pub last_payment_error: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl PaymentIntentData {
    /// Parse from a webhook event
    pub fn from_event(event: &WebhookEvent) -> PaymentResult<Self> {
        let raw = event
            .raw_data
            .as_ref()
            .ok_or_else(|| PaymentError::WebhookParseError("Missing raw data".to_string()))?;

        let obj = raw.as_object().ok_or_else(|| {
            PaymentError::WebhookParseError("Raw data is not an object".to_string())
        })?;

        let payment_intent_id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| {
                PaymentError::WebhookParseError("Missing payment intent id".to_string())
            })?;

        let amount = obj.get("amount").and_then(|v| v.as_i64()).unwrap_or(0);

        let currency = obj
            .get("currency")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let status = obj
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let last_payment_error = obj
            .get("last_payment_error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(Self {
            payment_intent_id,
            amount,
            currency,
            status,
            last_payment_error,
            metadata: event.metadata.clone(),
        })
    }

    /// Get the internal order ID from metadata
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_ORDER_ID).map(|s| s.as_str())
    }
}

/// Webhook event handler trait
///
/// Implement this trait to handle different webhook events.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Called when a payment intent succeeds
    async fn on_payment_succeeded(&self, data: PaymentIntentData) -> PaymentResult<()> {
        info!(
            "Payment succeeded: intent={}, amount={}",
            data.payment_intent_id, data.amount
        );
        Ok(())
    }

    /// Called when a payment attempt fails
    async fn on_payment_failed(&self, data: PaymentIntentData) -> PaymentResult<()> {
        warn!(
            "Payment failed: intent={}, order={:?}, reason={:?}",
            data.payment_intent_id,
            data.order_id(),
            data.last_payment_error
        );
        Ok(())
    }

    /// Called when a payment intent is canceled
    async fn on_payment_canceled(&self, data: PaymentIntentData) -> PaymentResult<()> {
        warn!(
            "Payment canceled: intent={}, order={:?}",
            data.payment_intent_id,
            data.order_id()
        );
        Ok(())
    }

    /// Called for unknown/unhandled events
    async fn on_unknown_event(&self, event: &WebhookEvent) -> PaymentResult<()> {
        debug!("Unhandled webhook event: {:?}", event.event_type);
        Ok(())
    }
}

/// Dispatch a webhook event to the appropriate handler method
pub async fn dispatch_webhook_event(
    handler: &dyn WebhookHandler,
    event: WebhookEvent,
) -> PaymentResult<()> {
    match &event.event_type {
        WebhookEventType::PaymentSucceeded => {
            let data = PaymentIntentData::from_event(&event)?;
            handler.on_payment_succeeded(data).await
        }
        WebhookEventType::PaymentFailed => {
            let data = PaymentIntentData::from_event(&event)?;
            handler.on_payment_failed(data).await
        }
        WebhookEventType::PaymentCanceled => {
            let data = PaymentIntentData::from_event(&event)?;
            handler.on_payment_canceled(data).await
        }
        WebhookEventType::Unknown(_) => handler.on_unknown_event(&event).await,
    }
}

/// Events that should be enabled in the Stripe Dashboard
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "payment_intent.canceled",
];

/// Instructions for setting up the webhook endpoint
pub fn webhook_setup_instructions(endpoint_url: &str) -> Vec<String> {
    let mut lines = vec![
        "Stripe webhook setup:".to_string(),
        "  1. Go to https://dashboard.stripe.com/webhooks and add an endpoint".to_string(),
        format!("  2. Endpoint URL: {}", endpoint_url),
        "  3. Select these events:".to_string(),
    ];
    lines.extend(
        REQUIRED_WEBHOOK_EVENTS
            .iter()
            .map(|event| format!("     - {}", event)),
    );
    lines.push("  4. Copy the signing secret (whsec_...) to STRIPE_WEBHOOK_SECRET".to_string());
    lines.push(format!(
        "  Local testing: stripe listen --forward-to {}",
        endpoint_url
    ));
    lines
}
