//! PostgreSQL aggregates for the admin statistics view.
//!
//! Grouped counts use raw SQL with `FILTER` clauses; Diesel's DSL has no
//! equivalent for conditional aggregates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Timestamptz;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    MinuteBucket, StatsRepository, StatsRepositoryError, StoreTotals, TriggerOutcomeCounts,
    UserActivity,
};
use crate::domain::{TriggerId, UserId};

use super::error_mapping::{classify_diesel_error, count, pool_error_message};
use super::models::{MinuteBucketRow, TriggerOutcomeRow, UserActivityRow};
use super::pool::{DbPool, PoolError};
use super::schema::{recharges, users};

const TRIGGER_OUTCOMES_SQL: &str = "\
SELECT a.trigger_id,
       COUNT(*) FILTER (WHERE a.success AND NOT u.is_admin) AS public_successes,
       COUNT(*) FILTER (WHERE a.success AND u.is_admin) AS admin_successes,
       COUNT(*) FILTER (WHERE NOT a.success AND NOT u.is_admin) AS public_failures,
       COUNT(*) FILTER (WHERE NOT a.success AND u.is_admin) AS admin_failures
FROM actions a
JOIN users u ON u.id = a.user_id
GROUP BY a.trigger_id";

const MINUTE_BUCKETS_SQL: &str = "\
SELECT date_trunc('minute', a.occurred_at) AS minute,
       COUNT(*) FILTER (WHERE NOT u.is_admin) AS public_count,
       COUNT(*) FILTER (WHERE u.is_admin) AS admin_count
FROM actions a
JOIN users u ON u.id = a.user_id
WHERE a.occurred_at >= $1
GROUP BY 1
ORDER BY 1";

const USER_ACTIVITY_SQL: &str = "\
SELECT u.id AS user_id, u.created_at, u.is_admin, COUNT(a.id) AS actions
FROM users u
LEFT JOIN actions a ON a.user_id = u.id
GROUP BY u.id, u.created_at, u.is_admin
ORDER BY u.created_at DESC";

/// Diesel implementation of [`StatsRepository`].
#[derive(Clone)]
pub struct DieselStatsRepository {
    pool: DbPool,
}

impl DieselStatsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> StatsRepositoryError {
    StatsRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error, operation: &str) -> StatsRepositoryError {
    match classify_diesel_error(error, operation) {
        Ok(message) => StatsRepositoryError::query(message),
        Err(message) => StatsRepositoryError::connection(message),
    }
}

#[async_trait]
impl StatsRepository for DieselStatsRepository {
    async fn totals(&self) -> Result<StoreTotals, StatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "count users"))?;
        let recharge_count: i64 = recharges::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "count recharges"))?;
        Ok(StoreTotals {
            users: count(user_count),
            recharges: count(recharge_count),
        })
    }

    async fn trigger_outcomes(&self) -> Result<Vec<TriggerOutcomeCounts>, StatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TriggerOutcomeRow> = diesel::sql_query(TRIGGER_OUTCOMES_SQL)
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "trigger outcomes"))?;
        Ok(rows
            .into_iter()
            .map(|row| TriggerOutcomeCounts {
                trigger_id: TriggerId::new(row.trigger_id),
                public_successes: count(row.public_successes),
                admin_successes: count(row.admin_successes),
                public_failures: count(row.public_failures),
                admin_failures: count(row.admin_failures),
            })
            .collect())
    }

    async fn activations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MinuteBucket>, StatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MinuteBucketRow> = diesel::sql_query(MINUTE_BUCKETS_SQL)
            .bind::<Timestamptz, _>(since)
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "activations per minute"))?;
        Ok(rows
            .into_iter()
            .map(|row| MinuteBucket {
                minute: row.minute,
                public_count: count(row.public_count),
                admin_count: count(row.admin_count),
            })
            .collect())
    }

    async fn user_activity(&self) -> Result<Vec<UserActivity>, StatsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserActivityRow> = diesel::sql_query(USER_ACTIVITY_SQL)
            .load(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "user activity"))?;
        Ok(rows
            .into_iter()
            .map(|row| UserActivity {
                user_id: UserId::from_uuid(row.user_id),
                created_at: row.created_at,
                is_admin: row.is_admin,
                actions: count(row.actions),
            })
            .collect())
    }
}
