//! Shared HTTP adapter state.
//!
//! Handlers receive this via `web::Data` and only see domain services and
//! ports, so they stay testable without I/O.

use std::sync::Arc;

use super::admin::AdminSecret;
use crate::domain::ports::{TokenLedger, UserRepository};
use crate::domain::{ActivationService, StatsService, TriggerRegistry};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub triggers: Arc<TriggerRegistry>,
    pub activation: Arc<ActivationService>,
    pub ledger: Arc<dyn TokenLedger>,
    pub users: Arc<dyn UserRepository>,
    pub stats: Arc<StatsService>,
    pub admin_secret: Arc<AdminSecret>,
    /// Balance granted to new public users and restored by a recharge.
    pub default_tokens: u32,
}
