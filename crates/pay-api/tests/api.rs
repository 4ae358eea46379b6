//! End-to-end tests for the payment routes, with Stripe mocked by wiremock.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use chrono::{DateTime, Utc};
use pay_api::{create_router, AppConfig, AppState};
use pay_core::{
    BoxedOrderRepository, FulfillmentStatus, MarkPaidOutcome, Order, OrderRepository,
    PaymentError, PaymentResult, PaymentStatus,
};
use pay_store::MemoryOrderStore;
use pay_stripe::{signature_header, StripeConfig, StripePaymentIntentStrategy};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_SECRET: &str = "whsec_test_secret";
const ORDER_ID: &str = "ord_1001";

struct Harness {
    server: TestServer,
    stripe: MockServer,
    orders: Arc<MemoryOrderStore>,
}

fn sample_order() -> Order {
    Order::new(25.5)
        .with_id(ORDER_ID)
        .with_order_number("1001")
        .with_customer("Ada Lovelace", Some("ada@example.com".to_string()))
}

/// Order store whose backend is down
struct UnavailableStore;

#[async_trait]
impl OrderRepository for UnavailableStore {
    async fn find_by_id(&self, _order_id: &str) -> PaymentResult<Option<Order>> {
        Err(PaymentError::Database("connection refused".to_string()))
    }

    async fn mark_paid(
        &self,
        _order_id: &str,
        _payment_intent_id: &str,
        _paid_at: DateTime<Utc>,
    ) -> PaymentResult<MarkPaidOutcome> {
        Err(PaymentError::Database("connection refused".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

fn server_with(stripe: &MockServer, orders: BoxedOrderRepository) -> TestServer {
    let config = StripeConfig::new("sk_test_abc123", WEBHOOK_SECRET).with_api_base_url(stripe.uri());
    let strategy = StripePaymentIntentStrategy::new(config).unwrap();

    let state = AppState::with_parts(Arc::new(strategy), orders, AppConfig::default());
    TestServer::new(create_router(state)).unwrap()
}

async fn harness() -> Harness {
    let stripe = MockServer::start().await;
    let orders = Arc::new(MemoryOrderStore::with_orders([sample_order()]));
    let server = server_with(&stripe, orders.clone());

    Harness {
        server,
        stripe,
        orders,
    }
}

fn intent_event(event_type: &str, order_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_1",
        "object": "event",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "pi_123",
                "object": "payment_intent",
                "amount": 2550,
                "currency": "usd",
                "status": "succeeded",
                "metadata": {
                    "orderId": order_id,
                    "customerName": "Ada Lovelace",
                    "orderNumber": "1001"
                }
            }
        }
    }))
    .unwrap()
}

async fn deliver(server: &TestServer, payload: Vec<u8>, signature: &str) -> TestResponse {
    server
        .post("/api/stripe-webhook")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(signature).unwrap(),
        )
        .bytes(Bytes::from(payload))
        .await
}

async fn deliver_signed(server: &TestServer, payload: Vec<u8>) -> TestResponse {
    let signature = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &payload);
    deliver(server, payload, &signature).await
}

async fn stored_order(orders: &MemoryOrderStore) -> Order {
    orders.find_by_id(ORDER_ID).await.unwrap().unwrap()
}

// =============================================================================
// Payment intent creation
// =============================================================================

#[tokio::test]
async fn missing_order_returns_404_without_calling_stripe() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.stripe)
        .await;

    let response = h
        .server
        .post("/api/orders/ord_missing/create-payment-intent")
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>(), json!({ "error": "Order not found" }));
    h.stripe.verify().await;
}

#[tokio::test]
async fn existing_order_creates_intent_with_minor_units_and_metadata() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(body_string_contains("amount=2550"))
        .and(body_string_contains("currency=usd"))
        .and(body_string_contains("metadata%5BorderId%5D=ord_1001"))
        .and(body_string_contains("metadata%5BcustomerName%5D=Ada+Lovelace"))
        .and(body_string_contains("metadata%5BorderNumber%5D=1001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "object": "payment_intent",
            "client_secret": "pi_123_secret_abc",
            "amount": 2550,
            "currency": "usd",
            "status": "requires_payment_method"
        })))
        .expect(1)
        .mount(&h.stripe)
        .await;

    let response = h
        .server
        .post("/api/orders/ord_1001/create-payment-intent")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "clientSecret": "pi_123_secret_abc" })
    );

    // Creating an intent does not touch the order
    assert_eq!(stored_order(&h.orders).await.payment_status, PaymentStatus::Unpaid);
}

#[tokio::test]
async fn stripe_failure_returns_500_with_message() {
    let h = harness().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "Invalid API Key provided: sk_test_****c123"
            }
        })))
        .mount(&h.stripe)
        .await;

    let response = h
        .server
        .post("/api/orders/ord_1001/create-payment-intent")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Failed to create payment intent");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Invalid API Key provided"));
}

#[tokio::test]
async fn store_failure_during_lookup_returns_500_without_calling_stripe() {
    let stripe = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&stripe)
        .await;
    let server = server_with(&stripe, Arc::new(UnavailableStore));

    let response = server
        .post("/api/orders/ord_1001/create-payment-intent")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Failed to create payment intent");
    assert_eq!(body["message"], "Database error: connection refused");
    stripe.verify().await;
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn invalid_signature_returns_400_and_leaves_order_unpaid() {
    let h = harness().await;
    let payload = intent_event("payment_intent.succeeded", ORDER_ID);
    let forged = signature_header("whsec_attacker", Utc::now().timestamp(), &payload);

    let response = deliver(&h.server, payload, &forged).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.text().starts_with("Webhook Error: "));

    let order = stored_order(&h.orders).await;
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert!(order.payment_intent_id.is_none());
}

#[tokio::test]
async fn missing_signature_header_returns_400() {
    let h = harness().await;

    let response = h
        .server
        .post("/api/stripe-webhook")
        .bytes(Bytes::from(intent_event("payment_intent.succeeded", ORDER_ID)))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.text().starts_with("Webhook Error: "));
    assert!(!stored_order(&h.orders).await.is_paid());
}

#[tokio::test]
async fn succeeded_webhook_marks_order_paid() {
    let h = harness().await;
    let before = Utc::now();

    let response = deliver_signed(&h.server, intent_event("payment_intent.succeeded", ORDER_ID)).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "received": true }));

    let order = stored_order(&h.orders).await;
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, FulfillmentStatus::Confirmed);
    assert_eq!(order.payment_intent_id.as_deref(), Some("pi_123"));
    assert!(order.paid_at.unwrap() >= before);
}

#[tokio::test]
async fn unhandled_event_type_is_acknowledged_without_changes() {
    let h = harness().await;
    let before = stored_order(&h.orders).await;

    let response = deliver_signed(&h.server, intent_event("charge.refunded", ORDER_ID)).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "received": true }));
    assert_eq!(stored_order(&h.orders).await, before);
}

#[tokio::test]
async fn failed_payment_is_acknowledged_without_changes() {
    let h = harness().await;

    let response =
        deliver_signed(&h.server, intent_event("payment_intent.payment_failed", ORDER_ID)).await;

    response.assert_status_ok();
    assert_eq!(stored_order(&h.orders).await.payment_status, PaymentStatus::Unpaid);
}

#[tokio::test]
async fn duplicate_succeeded_delivery_is_idempotent() {
    let h = harness().await;

    deliver_signed(&h.server, intent_event("payment_intent.succeeded", ORDER_ID))
        .await
        .assert_status_ok();
    let first = stored_order(&h.orders).await;

    deliver_signed(&h.server, intent_event("payment_intent.succeeded", ORDER_ID))
        .await
        .assert_status_ok();
    let second = stored_order(&h.orders).await;

    assert!(second.is_paid());
    assert_eq!(second.paid_at, first.paid_at);
    assert_eq!(second.payment_intent_id, first.payment_intent_id);
}

#[tokio::test]
async fn succeeded_webhook_for_unknown_order_is_acknowledged() {
    let h = harness().await;

    let response = deliver_signed(&h.server, intent_event("payment_intent.succeeded", "ord_gone")).await;

    response.assert_status_ok();
    assert!(h.orders.find_by_id("ord_gone").await.unwrap().is_none());
    assert!(!stored_order(&h.orders).await.is_paid());
}

#[tokio::test]
async fn health_reports_provider_and_store() {
    let h = harness().await;

    let response = h.server.get("/health").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["provider"], "stripe");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn store_failure_while_marking_paid_returns_500_json() {
    let stripe = MockServer::start().await;
    let server = server_with(&stripe, Arc::new(UnavailableStore));

    let response = deliver_signed(&server, intent_event("payment_intent.succeeded", ORDER_ID)).await;

    // Stripe redelivers on 5xx
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({
            "error": "Webhook handling failed",
            "message": "Database error: connection refused"
        })
    );
}
