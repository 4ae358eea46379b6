//! # pay-store
//!
//! `OrderRepository` implementations.
//!
//! - `MemoryOrderStore` - in-process map, optionally seeded from TOML
//! - `PgOrderStore` - PostgreSQL via sqlx (feature `postgres`, on by default)

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryOrderStore;
#[cfg(feature = "postgres")]
pub use postgres::PgOrderStore;
