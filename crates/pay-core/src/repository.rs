//! # Order Repository
//!
//! Port to the order store. The payment flow only ever reads an order by
//! ID and records a successful payment on it.

use crate::error::PaymentResult;
use crate::order::Order;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Result of recording a payment against an order
#[derive(Debug, Clone, PartialEq)]
pub enum MarkPaidOutcome {
    /// The order moved from unpaid to paid
    Updated(Order),
    /// The order was already paid; nothing changed
    AlreadyPaid(Order),
    /// No order with that ID exists
    NotFound,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Look up an order by ID.
    async fn find_by_id(&self, order_id: &str) -> PaymentResult<Option<Order>>;

    /// Atomically mark an unpaid order as paid.
    ///
    /// Sets payment status to paid, records the intent ID and `paid_at`,
    /// and advances fulfillment status to confirmed. An already-paid order
    /// is left untouched.
    async fn mark_paid(
        &self,
        order_id: &str,
        payment_intent_id: &str,
        paid_at: DateTime<Utc>,
    ) -> PaymentResult<MarkPaidOutcome>;

    /// Backend name (for logging).
    fn backend_name(&self) -> &'static str;
}

pub type BoxedOrderRepository = Arc<dyn OrderRepository>;
