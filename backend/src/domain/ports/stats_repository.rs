//! Read-only port over the activation log for dashboard statistics.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{TriggerId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading statistics.
    pub enum StatsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "stats repository connection failed: {message}",
        /// Aggregate query failed.
        Query { message: String } => "stats repository query failed: {message}",
    }
}

/// Whole-store totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreTotals {
    pub users: u64,
    pub recharges: u64,
}

/// Outcome counts for one trigger id across the whole log.
///
/// Unresolved (pending) actions count as failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerOutcomeCounts {
    pub trigger_id: TriggerId,
    pub public_successes: u64,
    pub admin_successes: u64,
    pub public_failures: u64,
    pub admin_failures: u64,
}

/// Activations logged in one UTC minute, split by caller class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteBucket {
    /// Start of the minute, truncated.
    pub minute: DateTime<Utc>,
    pub public_count: u64,
    pub admin_count: u64,
}

/// Per-user activity summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
    pub actions: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn totals(&self) -> Result<StoreTotals, StatsRepositoryError>;

    /// Per-trigger outcome counts, in no particular order.
    async fn trigger_outcomes(&self) -> Result<Vec<TriggerOutcomeCounts>, StatsRepositoryError>;

    /// Non-empty minute buckets for actions logged at or after `since`.
    async fn activations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MinuteBucket>, StatsRepositoryError>;

    /// Every user with their action count, newest users first.
    async fn user_activity(&self) -> Result<Vec<UserActivity>, StatsRepositoryError>;
}
