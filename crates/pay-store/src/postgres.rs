//! # PostgreSQL Order Store
//!
//! Persistent order store backed by sqlx. Schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pay_core::{
    FulfillmentStatus, MarkPaidOutcome, Order, OrderRepository, PaymentError, PaymentResult,
    PaymentStatus,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, total_amount, \
                             payment_status, payment_intent_id, paid_at, status, created_at";

fn db_err(e: sqlx::Error) -> PaymentError {
    PaymentError::Database(e.to_string())
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: Option<String>,
    customer_name: Option<String>,
    customer_email: Option<String>,
    total_amount: f64,
    payment_status: String,
    payment_intent_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = PaymentError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            total_amount: row.total_amount,
            payment_status: row.payment_status.parse::<PaymentStatus>()?,
            payment_intent_id: row.payment_intent_id,
            paid_at: row.paid_at,
            status: row.status.parse::<FulfillmentStatus>()?,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL implementation of `OrderRepository`
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> PaymentResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(db_err)?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> PaymentResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentError::Database(format!("Migration failed: {}", e)))?;
        info!("Order store migrations applied");
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PgOrderStore {
    async fn find_by_id(&self, order_id: &str) -> PaymentResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(Order::try_from).transpose()
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        payment_intent_id: &str,
        paid_at: DateTime<Utc>,
    ) -> PaymentResult<MarkPaidOutcome> {
        // Single conditional statement; concurrent deliveries cannot both win
        let updated: Option<OrderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE orders SET
                payment_status = $2,
                payment_intent_id = $3,
                paid_at = $4,
                status = $5,
                updated_at = now()
            WHERE id = $1 AND payment_status <> $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(PaymentStatus::Paid.as_str())
        .bind(payment_intent_id)
        .bind(paid_at)
        .bind(FulfillmentStatus::Confirmed.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = updated {
            return Ok(MarkPaidOutcome::Updated(row.try_into()?));
        }

        match self.find_by_id(order_id).await? {
            Some(order) => Ok(MarkPaidOutcome::AlreadyPaid(order)),
            None => Ok(MarkPaidOutcome::NotFound),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
