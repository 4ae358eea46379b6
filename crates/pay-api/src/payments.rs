//! # Order Payment Updates
//!
//! Webhook handler that records successful payments on orders.

use async_trait::async_trait;
use chrono::Utc;
use pay_core::{BoxedOrderRepository, MarkPaidOutcome, PaymentResult};
use pay_stripe::{PaymentIntentData, WebhookHandler};
use tracing::{info, warn};

/// Marks the order referenced by a succeeded intent as paid
pub struct MarkOrderPaid {
    orders: BoxedOrderRepository,
}

impl MarkOrderPaid {
    pub fn new(orders: BoxedOrderRepository) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl WebhookHandler for MarkOrderPaid {
    async fn on_payment_succeeded(&self, data: PaymentIntentData) -> PaymentResult<()> {
        let Some(order_id) = data.order_id() else {
            // Acknowledge anyway: redelivery cannot fix missing metadata
            warn!(
                "Payment intent {} succeeded without orderId metadata",
                data.payment_intent_id
            );
            return Ok(());
        };

        info!("Payment succeeded for order {}", order_id);

        match self
            .orders
            .mark_paid(order_id, &data.payment_intent_id, Utc::now())
            .await?
        {
            MarkPaidOutcome::Updated(order) => {
                info!(
                    "Order {} marked as paid (intent={}, status={})",
                    order.id,
                    data.payment_intent_id,
                    order.status.as_str()
                );
            }
            MarkPaidOutcome::AlreadyPaid(order) => {
                info!(
                    "Order {} already paid by {:?}, ignoring delivery for {}",
                    order.id, order.payment_intent_id, data.payment_intent_id
                );
            }
            MarkPaidOutcome::NotFound => {
                warn!(
                    "Payment intent {} references unknown order {}",
                    data.payment_intent_id, order_id
                );
            }
        }

        Ok(())
    }
}
