//! # pay-core
//!
//! Core types and traits for order payments.
//!
//! This crate provides:
//! - `Order` with its payment and fulfillment statuses
//! - `PaymentIntentRequest`, `PaymentIntent`, and `WebhookEvent` value objects
//! - `PaymentStrategy` trait for implementing payment providers
//! - `OrderRepository` trait for order stores
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{Currency, PaymentIntentRequest, PaymentStrategy};
//!
//! let order = orders.find_by_id("ord_123").await?.ok_or(...)?;
//! let request = PaymentIntentRequest::for_order(&order, Currency::USD);
//! let intent = strategy.create_payment_intent(&request).await?;
//!
//! // Hand intent.client_secret to the client-side payment UI
//! ```

pub mod currency;
pub mod error;
pub mod intent;
pub mod order;
pub mod repository;
pub mod strategy;

// Re-exports for convenience
pub use currency::Currency;
pub use error::{PaymentError, PaymentResult};
pub use intent::{
    PaymentIntent, PaymentIntentRequest, WebhookEvent, WebhookEventType, METADATA_CUSTOMER_NAME,
    METADATA_ORDER_ID, METADATA_ORDER_NUMBER,
};
pub use order::{FulfillmentStatus, Order, PaymentStatus};
pub use repository::{BoxedOrderRepository, MarkPaidOutcome, OrderRepository};
pub use strategy::{BoxedPaymentStrategy, PaymentStrategy};
