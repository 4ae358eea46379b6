//! # pay-stripe
//!
//! Stripe payment strategy for order payments.
//!
//! **StripePaymentIntentStrategy** drives the PaymentIntents API:
//! - Amount in minor units with order metadata for traceability
//! - Client secret handed back for client-side confirmation
//! - `Stripe-Signature` verification for webhook deliveries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_stripe::StripePaymentIntentStrategy;
//! use pay_core::{Currency, PaymentIntentRequest, PaymentStrategy};
//!
//! let strategy = StripePaymentIntentStrategy::from_env()?;
//!
//! let request = PaymentIntentRequest::for_order(&order, Currency::USD);
//! let intent = strategy.create_payment_intent(&request).await?;
//!
//! // Return intent.client_secret to the browser
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use pay_stripe::webhook::{dispatch_webhook_event, PaymentIntentData, WebhookHandler};
//!
//! struct MarkOrderPaid;
//!
//! #[async_trait]
//! impl WebhookHandler for MarkOrderPaid {
//!     async fn on_payment_succeeded(&self, data: PaymentIntentData) -> PaymentResult<()> {
//!         println!("Order {} paid!", data.order_id().unwrap_or("unknown"));
//!         Ok(())
//!     }
//! }
//!
//! let event = strategy.verify_webhook(payload, signature).await?;
//! dispatch_webhook_event(&MarkOrderPaid, event).await?;
//! ```

pub mod config;
pub mod intents;
pub mod signature;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use intents::StripePaymentIntentStrategy;
pub use signature::{compute_signature, signature_header, verify_signature};
pub use webhook::{
    dispatch_webhook_event, webhook_setup_instructions, PaymentIntentData,
    WebhookHandler, REQUIRED_WEBHOOK_EVENTS,
};
