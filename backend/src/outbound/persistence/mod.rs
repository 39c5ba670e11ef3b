//! PostgreSQL persistence adapters using Diesel with `diesel-async` and `bb8`.
//!
//! Repositories only translate between row structs and domain types; row
//! structs (`models.rs`) and table definitions (`schema.rs`) stay private.
//!
//! ```ignore
//! use maze_dashboard::outbound::persistence::{DbPool, DieselTokenLedger, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/dashboard")).await?;
//! let ledger = DieselTokenLedger::new(pool);
//! ```

mod diesel_stats_repository;
mod diesel_token_ledger;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_stats_repository::DieselStatsRepository;
pub use diesel_token_ledger::DieselTokenLedger;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
