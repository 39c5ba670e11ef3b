//! Haunted maze prop activation dashboard.
//!
//! Guests spend tokens to fire scare props; admins fire them for free and
//! watch activity statistics. The crate follows a hexagonal layout:
//! [`domain`] owns the activation rules and ports, [`inbound`] exposes them
//! over HTTP and [`outbound`] talks to PostgreSQL, the trigger table file and
//! the devices themselves.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::trace_requests;
