//! # Stripe Payment Intents
//!
//! Implementation of the Stripe PaymentIntents API.
//! The client confirms the intent with the returned client secret; the
//! outcome comes back through the webhook.

use crate::config::StripeConfig;
use crate::signature::verify_signature;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pay_core::{
    Currency, PaymentError, PaymentIntent, PaymentIntentRequest, PaymentResult, PaymentStrategy,
    WebhookEvent, WebhookEventType,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "stripe";

/// Stripe PaymentIntents strategy
pub struct StripePaymentIntentStrategy {
    config: StripeConfig,
    client: Client,
}

impl StripePaymentIntentStrategy {
    /// Create a new Stripe payment intent strategy
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = StripeConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Build form data for the Stripe API
    fn form_params(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount.to_string()),
            ("currency".to_string(), request.currency.as_str().to_string()),
        ];

        if let Some(ref description) = request.description {
            form_params.push(("description".to_string(), description.clone()));
        }

        if let Some(ref email) = request.receipt_email {
            form_params.push(("receipt_email".to_string(), email.clone()));
        }

        // Sorted so the request body is stable
        let mut metadata: Vec<_> = request.metadata.iter().collect();
        metadata.sort();
        for (key, value) in metadata {
            form_params.push((format!("metadata[{}]", key), value.clone()));
        }

        form_params
    }

    /// Verify a webhook against an explicit clock (unix seconds)
    pub fn verify_webhook_at(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> PaymentResult<WebhookEvent> {
        verify_signature(
            payload,
            signature,
            &self.config.webhook_secret,
            self.config.webhook_tolerance_secs,
            now,
        )?;

        parse_event(payload)
    }
}

#[async_trait]
impl PaymentStrategy for StripePaymentIntentStrategy {
    #[instrument(skip(self, request), fields(amount = request.amount, order_id = ?request.order_id()))]
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> PaymentResult<PaymentIntent> {
        if request.amount <= 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "Amount must be positive, got {}",
                request.amount
            )));
        }

        debug!(
            "Creating Stripe payment intent: amount={}, currency={}",
            request.amount, request.currency
        );

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version);

        if let Some(ref key) = request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let response = builder
            .form(&Self::form_params(request))
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(PaymentError::ProviderError {
                    provider: PROVIDER.to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            PaymentError::ProviderError {
                provider: PROVIDER.to_string(),
                message: format!("Payment intent {} has no client secret", intent.id),
            }
        })?;

        info!(
            "Created Stripe payment intent: id={}, status={}",
            intent.id, intent.status
        );

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
            amount: intent.amount,
            currency: intent.currency.parse().unwrap_or(request.currency),
            status: intent.status,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<WebhookEvent> {
        self.verify_webhook_at(payload, signature, Utc::now().timestamp())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a Stripe event type string
pub fn event_type_from_str(event_type: &str) -> WebhookEventType {
    match event_type {
        "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
        "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
        "payment_intent.canceled" => WebhookEventType::PaymentCanceled,
        other => WebhookEventType::Unknown(other.to_string()),
    }
}

/// Parse an already-verified webhook body
fn parse_event(payload: &[u8]) -> PaymentResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Verified Stripe webhook: type={}", event.event_type);

    let event_type = event_type_from_str(&event.event_type);
    let object = event.data.object;

    // payment_intent.* objects are the intent itself; charges etc. reference it
    let payment_intent_id = match event_type {
        WebhookEventType::Unknown(_) => object.get("payment_intent"),
        _ => object.get("id"),
    }
    .and_then(|v| v.as_str())
    .map(String::from);

    let amount = object.get("amount").and_then(|v| v.as_i64());

    let metadata: HashMap<String, String> = object
        .get("metadata")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(WebhookEvent {
        event_id: event.id,
        event_type,
        provider: PROVIDER.to_string(),
        payment_intent_id,
        amount,
        metadata,
        raw_data: Some(serde_json::Value::Object(object)),
        timestamp: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}

// =============================================================================
// Stripe API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}
