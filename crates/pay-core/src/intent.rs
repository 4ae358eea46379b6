//! # Payment Intent Types
//!
//! Value objects exchanged with a payment provider: the intent request we
//! send, the intent the provider returns, and verified webhook events.

use crate::currency::Currency;
use crate::order::Order;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key carrying our order ID on the provider side
pub const METADATA_ORDER_ID: &str = "orderId";
/// Metadata key carrying the customer name
pub const METADATA_CUSTOMER_NAME: &str = "customerName";
/// Metadata key carrying the order number
pub const METADATA_ORDER_NUMBER: &str = "orderNumber";

const DEFAULT_CUSTOMER_NAME: &str = "Customer";
const DESCRIPTION_PREFIX: &str = "Custom Frame Order";

/// Request to create a payment intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Amount in smallest currency unit
    pub amount: i64,

    pub currency: Currency,

    /// Traceability metadata stored on the provider's intent
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Description shown in the provider dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where the provider sends the receipt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_email: Option<String>,

    /// Idempotency key (prevents duplicate intents on client retries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl PaymentIntentRequest {
    /// Build the intent request for an order's full total
    pub fn for_order(order: &Order, currency: Currency) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(METADATA_ORDER_ID.to_string(), order.id.clone());
        metadata.insert(
            METADATA_CUSTOMER_NAME.to_string(),
            order
                .customer_name
                .clone()
                .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
        );
        metadata.insert(
            METADATA_ORDER_NUMBER.to_string(),
            order.display_number().to_string(),
        );

        Self {
            amount: order.total(currency),
            currency,
            metadata,
            description: Some(format!("{} #{}", DESCRIPTION_PREFIX, order.display_number())),
            receipt_email: order.customer_email.clone(),
            idempotency_key: None,
        }
    }

    /// Set idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Our order ID, as carried in metadata
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_ORDER_ID).map(|s| s.as_str())
    }
}

/// A payment intent created by a payment provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Provider's intent ID
    pub id: String,

    /// Secret handed to the client-side payment UI
    pub client_secret: String,

    pub amount: i64,

    pub currency: Currency,

    /// Provider status (e.g. "requires_payment_method")
    pub status: String,
}

/// Webhook event types we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Payment intent succeeded
    PaymentSucceeded,
    /// Payment attempt failed
    PaymentFailed,
    /// Payment intent canceled
    PaymentCanceled,
    /// Unknown event (passthrough)
    Unknown(String),
}

/// A verified webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider
    pub event_id: String,

    pub event_type: WebhookEventType,

    /// Provider name
    pub provider: String,

    /// Related payment intent ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Amount (in smallest unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// Metadata of the event's object
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Raw event object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl WebhookEvent {
    /// Our order ID from the event object's metadata
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_ORDER_ID).map(|s| s.as_str())
    }
}
