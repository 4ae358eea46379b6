//! # In-Memory Order Store
//!
//! `HashMap`-backed order store for development and tests. Can be seeded
//! from a TOML file:
//!
//! ```toml
//! [[orders]]
//! id = "ord_1001"
//! order_number = "1001"
//! customer_name = "Ada Lovelace"
//! customer_email = "ada@example.com"
//! total_amount = 149.99
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pay_core::{MarkPaidOutcome, Order, OrderRepository, PaymentError, PaymentResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    orders: Vec<Order>,
}

/// In-memory order store
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with orders
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let orders = orders
            .into_iter()
            .map(|order| (order.id.clone(), order))
            .collect();
        Self {
            orders: RwLock::new(orders),
        }
    }

    /// Parse seed orders from TOML
    pub fn from_toml_str(content: &str) -> PaymentResult<Self> {
        let seed: SeedFile = toml::from_str(content)
            .map_err(|e| PaymentError::Configuration(format!("Invalid order seed file: {}", e)))?;
        Ok(Self::with_orders(seed.orders))
    }

    /// Load seed orders from a TOML file
    pub fn from_seed_file(path: impl AsRef<Path>) -> PaymentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PaymentError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderStore {
    async fn find_by_id(&self, order_id: &str) -> PaymentResult<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        payment_intent_id: &str,
        paid_at: DateTime<Utc>,
    ) -> PaymentResult<MarkPaidOutcome> {
        let mut orders = self.orders.write().await;

        let Some(order) = orders.get_mut(order_id) else {
            return Ok(MarkPaidOutcome::NotFound);
        };

        if order.mark_paid(payment_intent_id, paid_at) {
            Ok(MarkPaidOutcome::Updated(order.clone()))
        } else {
            Ok(MarkPaidOutcome::AlreadyPaid(order.clone()))
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
