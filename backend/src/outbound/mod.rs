//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL token ledger, users and statistics via Diesel
//! - **devices**: HTTP and Govee LAN executors for triggers
//! - **trigger_config**: trigger table file loading and hot reload
//!
//! Adapters translate between domain types and wire or row formats. They hold
//! no activation logic.

pub mod devices;
pub mod persistence;
pub mod trigger_config;
