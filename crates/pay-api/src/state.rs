//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the payment strategy, the order store, and configuration.

use pay_core::{BoxedOrderRepository, BoxedPaymentStrategy, Currency};
use pay_store::{MemoryOrderStore, PgOrderStore};
use pay_stripe::StripePaymentIntentStrategy;
use std::sync::Arc;
use tracing::{info, warn};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL (used in webhook setup hints)
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Currency for payment intents
    pub currency: Currency,
    /// PostgreSQL URL; in-memory store when unset
    pub database_url: Option<String>,
    /// TOML file seeding the in-memory store
    pub orders_seed_file: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let currency = match std::env::var("PAYMENT_CURRENCY") {
            Ok(code) => code.parse()?,
            Err(_) => Currency::USD,
        };

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            currency,
            database_url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            orders_seed_file: std::env::var("ORDERS_SEED_FILE")
                .unwrap_or_else(|_| "config/orders.toml".to_string()),
            log_format,
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Public URL of the Stripe webhook endpoint
    pub fn webhook_url(&self) -> String {
        format!("{}/api/stripe-webhook", self.base_url.trim_end_matches('/'))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            environment: "development".to_string(),
            currency: Currency::USD,
            database_url: None,
            orders_seed_file: "config/orders.toml".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment provider
    pub strategy: BoxedPaymentStrategy,
    /// Order store
    pub orders: BoxedOrderRepository,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Stripe strategy and the configured store
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let strategy = StripePaymentIntentStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        if strategy.config().is_live_mode() {
            info!("Stripe: live mode");
            if !config.is_production() {
                warn!("Live Stripe keys in {} environment", config.environment);
            }
        } else {
            info!("Stripe: test mode");
        }

        let orders = load_order_store(&config).await?;

        Ok(Self::with_parts(Arc::new(strategy), orders, config))
    }

    /// Assemble state from already-built parts
    pub fn with_parts(
        strategy: BoxedPaymentStrategy,
        orders: BoxedOrderRepository,
        config: AppConfig,
    ) -> Self {
        Self {
            strategy,
            orders,
            config,
        }
    }
}

/// Connect to Postgres when configured, otherwise build the in-memory store
async fn load_order_store(config: &AppConfig) -> anyhow::Result<BoxedOrderRepository> {
    if let Some(url) = &config.database_url {
        let store = PgOrderStore::connect(url, 5)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to order database: {}", e))?;
        info!("Using PostgreSQL order store");
        return Ok(Arc::new(store));
    }

    let path = std::path::Path::new(&config.orders_seed_file);
    if path.exists() {
        let store = MemoryOrderStore::from_seed_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?;
        info!(
            "Loaded {} orders from {}",
            store.len().await,
            path.display()
        );
        return Ok(Arc::new(store));
    }

    warn!("No DATABASE_URL and no order seed file, using empty in-memory store");
    Ok(Arc::new(MemoryOrderStore::new()))
}
