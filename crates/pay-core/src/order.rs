//! # Order Types
//!
//! The slice of an order that the payment flow reads and updates.

use crate::currency::Currency;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Payment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No successful payment recorded yet
    Unpaid,
    /// A payment intent succeeded for this order
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(PaymentError::Serialization(format!(
                "Invalid payment status: {}",
                other
            ))),
        }
    }
}

/// Fulfillment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// Placed, awaiting payment
    Pending,
    /// Paid and accepted for fulfillment
    Confirmed,
    /// Being produced or packed
    Processing,
    /// Handed to the carrier
    Shipped,
    /// Received by the customer
    Delivered,
    /// Cancelled before fulfillment
    Cancelled,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Confirmed => "confirmed",
            FulfillmentStatus::Processing => "processing",
            FulfillmentStatus::Shipped => "shipped",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for FulfillmentStatus {
    fn default() -> Self {
        FulfillmentStatus::Pending
    }
}

impl FromStr for FulfillmentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FulfillmentStatus::Pending),
            "confirmed" => Ok(FulfillmentStatus::Confirmed),
            "processing" => Ok(FulfillmentStatus::Processing),
            "shipped" => Ok(FulfillmentStatus::Shipped),
            "delivered" => Ok(FulfillmentStatus::Delivered),
            "cancelled" => Ok(FulfillmentStatus::Cancelled),
            other => Err(PaymentError::Serialization(format!(
                "Invalid fulfillment status: {}",
                other
            ))),
        }
    }
}

/// An order as seen by the payment flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: String,

    /// Human-facing order number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,

    /// Customer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    /// Customer email (used as the receipt address)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Order total as a decimal currency value
    pub total_amount: f64,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    /// Provider payment intent that paid this order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,

    /// Fulfillment status
    #[serde(default)]
    pub status: FulfillmentStatus,

    /// Created timestamp
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new unpaid order with generated ID
    pub fn new(total_amount: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_number: None,
            customer_name: None,
            customer_email: None,
            total_amount,
            payment_status: PaymentStatus::Unpaid,
            payment_intent_id: None,
            paid_at: None,
            status: FulfillmentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Set the order ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the order number
    pub fn with_order_number(mut self, number: impl Into<String>) -> Self {
        self.order_number = Some(number.into());
        self
    }

    /// Set customer name and email
    pub fn with_customer(mut self, name: impl Into<String>, email: Option<String>) -> Self {
        self.customer_name = Some(name.into());
        self.customer_email = email;
        self
    }

    /// Order total in the currency's smallest unit
    pub fn total(&self, currency: Currency) -> i64 {
        currency.to_smallest_unit(self.total_amount)
    }

    /// Order number, falling back to the order ID
    pub fn display_number(&self) -> &str {
        self.order_number.as_deref().unwrap_or(&self.id)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Record a successful payment.
    ///
    /// Returns `false` and leaves the order untouched if it is already paid.
    pub fn mark_paid(&mut self, payment_intent_id: impl Into<String>, at: DateTime<Utc>) -> bool {
        if self.is_paid() {
            return false;
        }
        self.payment_status = PaymentStatus::Paid;
        self.payment_intent_id = Some(payment_intent_id.into());
        self.paid_at = Some(at);
        self.status = FulfillmentStatus::Confirmed;
        true
    }
}
