//! Dashboard statistics derived from the activation log.
//!
//! Read-only. Trigger names come from the current registry snapshot, so
//! triggers removed from the table still report counts with an empty name.

use std::sync::Arc;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use mockable::Clock;
use serde::Serialize;

use super::ports::{MinuteBucket, StatsRepository, StatsRepositoryError, UserActivity};
use super::{Error, TriggerRegistry};

/// Default length of the activations-per-minute series.
pub const DEFAULT_STATS_WINDOW_MINUTES: u32 = 60;

/// Outcome counts for one trigger, labelled with its current name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerStats {
    pub trigger_id: String,
    pub trigger_name: String,
    pub public_successes: u64,
    pub admin_successes: u64,
    pub public_failures: u64,
    pub admin_failures: u64,
    /// All unsuccessful actions, pending ones included.
    pub failures: u64,
}

/// One point of the activations-per-minute series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinutePoint {
    pub minute: DateTime<Utc>,
    pub public_count: u64,
    pub admin_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
    pub actions: u64,
}

/// Everything the admin statistics view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_recharges: u64,
    pub triggers: Vec<TriggerStats>,
    pub activations_per_minute: Vec<MinutePoint>,
    pub users: Vec<UserStats>,
}

/// Aggregates [`DashboardStats`] from a [`StatsRepository`].
#[derive(Clone)]
pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
    registry: Arc<TriggerRegistry>,
    clock: Arc<dyn Clock + Send + Sync>,
    window_minutes: u32,
}

impl StatsService {
    pub fn new(
        repository: Arc<dyn StatsRepository>,
        registry: Arc<TriggerRegistry>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            registry,
            clock,
            window_minutes: DEFAULT_STATS_WINDOW_MINUTES,
        }
    }

    /// Override the series length. Zero is treated as one minute.
    pub fn with_window_minutes(mut self, window_minutes: u32) -> Self {
        self.window_minutes = window_minutes.max(1);
        self
    }

    /// Build the full statistics view.
    ///
    /// # Errors
    /// Returns [`StatsRepositoryError`] when any aggregate query fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, StatsRepositoryError> {
        let now = truncate_to_minute(self.clock.utc())?;
        let since = now - TimeDelta::minutes(i64::from(self.window_minutes) - 1);

        let totals = self.repository.totals().await?;
        let outcomes = self.repository.trigger_outcomes().await?;
        let buckets = self.repository.activations_since(since).await?;
        let users = self.repository.user_activity().await?;

        let table = self.registry.current();
        let mut triggers: Vec<TriggerStats> = outcomes
            .into_iter()
            .map(|counts| TriggerStats {
                trigger_name: table
                    .find(&counts.trigger_id)
                    .map(|trigger| trigger.name.clone())
                    .unwrap_or_default(),
                trigger_id: counts.trigger_id.to_string(),
                public_successes: counts.public_successes,
                admin_successes: counts.admin_successes,
                public_failures: counts.public_failures,
                admin_failures: counts.admin_failures,
                failures: counts.public_failures + counts.admin_failures,
            })
            .collect();
        triggers.sort_by(|a, b| a.trigger_id.cmp(&b.trigger_id));

        Ok(DashboardStats {
            total_users: totals.users,
            total_recharges: totals.recharges,
            triggers,
            activations_per_minute: zero_fill_minutes(now, self.window_minutes, &buckets),
            users: users.into_iter().map(UserStats::from).collect(),
        })
    }
}

impl From<UserActivity> for UserStats {
    fn from(value: UserActivity) -> Self {
        Self {
            id: value.user_id.to_string(),
            created_at: value.created_at,
            is_admin: value.is_admin,
            actions: value.actions,
        }
    }
}

impl From<StatsRepositoryError> for Error {
    fn from(value: StatsRepositoryError) -> Self {
        match value {
            StatsRepositoryError::Connection { .. } => {
                Error::service_unavailable("statistics store unavailable")
            }
            StatsRepositoryError::Query { message } => Error::internal(message),
        }
    }
}

fn truncate_to_minute(instant: DateTime<Utc>) -> Result<DateTime<Utc>, StatsRepositoryError> {
    instant
        .duration_trunc(TimeDelta::minutes(1))
        .map_err(|err| StatsRepositoryError::query(format!("cannot truncate timestamp: {err}")))
}

/// Expand sparse minute buckets into exactly `window` points ending at
/// `now_minute`, oldest first. Buckets outside the window are ignored.
pub fn zero_fill_minutes(
    now_minute: DateTime<Utc>,
    window: u32,
    buckets: &[MinuteBucket],
) -> Vec<MinutePoint> {
    (0..window)
        .rev()
        .map(|offset| {
            let minute = now_minute - TimeDelta::minutes(i64::from(offset));
            let (public_count, admin_count) = buckets
                .iter()
                .filter(|bucket| bucket.minute == minute)
                .fold((0, 0), |(public, admin), bucket| {
                    (public + bucket.public_count, admin + bucket.admin_count)
                });
            MinutePoint {
                minute,
                public_count,
                admin_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    //! Statistics aggregation and zero-fill behaviour.
    use super::*;
    use crate::domain::ports::{MockStatsRepository, StoreTotals, TriggerOutcomeCounts};
    use crate::domain::{Trigger, TriggerId, TriggerKind, TriggerTable, UserId};
    use crate::test_support::MutableClock;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 31, 21, 30, 42)
            .single()
            .expect("valid timestamp")
    }

    fn minute(now: DateTime<Utc>, minutes_ago: i64) -> DateTime<Utc> {
        truncate_to_minute(now).expect("truncate") - TimeDelta::minutes(minutes_ago)
    }

    #[rstest]
    fn zero_fill_always_has_window_points(now: DateTime<Utc>) {
        let now_minute = minute(now, 0);
        let series = zero_fill_minutes(now_minute, 60, &[]);

        assert_eq!(series.len(), 60);
        assert_eq!(series.first().map(|p| p.minute), Some(minute(now, 59)));
        assert_eq!(series.last().map(|p| p.minute), Some(now_minute));
        assert!(series.iter().all(|p| p.public_count == 0 && p.admin_count == 0));
    }

    #[rstest]
    fn zero_fill_places_buckets_and_drops_stale_ones(now: DateTime<Utc>) {
        let buckets = [
            MinuteBucket {
                minute: minute(now, 0),
                public_count: 3,
                admin_count: 1,
            },
            MinuteBucket {
                minute: minute(now, 4),
                public_count: 2,
                admin_count: 0,
            },
            MinuteBucket {
                minute: minute(now, 90),
                public_count: 9,
                admin_count: 9,
            },
        ];
        let series = zero_fill_minutes(minute(now, 0), 5, &buckets);

        let counts: Vec<_> = series
            .iter()
            .map(|p| (p.public_count, p.admin_count))
            .collect();
        assert_eq!(counts, vec![(2, 0), (0, 0), (0, 0), (0, 0), (3, 1)]);
    }

    #[rstest]
    #[tokio::test]
    async fn stats_attach_current_trigger_names(now: DateTime<Utc>) {
        let mut repository = MockStatsRepository::new();
        repository.expect_totals().times(1).return_once(|| {
            Ok(StoreTotals {
                users: 4,
                recharges: 2,
            })
        });
        repository.expect_trigger_outcomes().times(1).return_once(|| {
            Ok(vec![
                TriggerOutcomeCounts {
                    trigger_id: TriggerId::new("scream"),
                    public_successes: 5,
                    admin_successes: 1,
                    public_failures: 2,
                    admin_failures: 1,
                },
                TriggerOutcomeCounts {
                    trigger_id: TriggerId::new("retired"),
                    public_successes: 1,
                    admin_successes: 0,
                    public_failures: 0,
                    admin_failures: 0,
                },
            ])
        });
        let expected_since = minute(now, 59);
        repository
            .expect_activations_since()
            .withf(move |since| *since == expected_since)
            .times(1)
            .return_once(|_| Ok(Vec::new()));
        repository.expect_user_activity().times(1).return_once(|| {
            Ok(vec![UserActivity {
                user_id: UserId::random(),
                created_at: Utc::now(),
                is_admin: false,
                actions: 8,
            }])
        });

        let registry = Arc::new(TriggerRegistry::new(TriggerTable::new(vec![Trigger::new(
            "scream",
            "Banshee Scream",
            TriggerKind::HttpDevice {
                address: "10.0.0.2".into(),
                secret_key: "k".into(),
            },
        )])));
        let service = StatsService::new(
            Arc::new(repository),
            registry,
            Arc::new(MutableClock::new(now)),
        );

        let stats = service.dashboard_stats().await.expect("stats load");

        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_recharges, 2);
        assert_eq!(stats.activations_per_minute.len(), 60);
        assert_eq!(stats.users.len(), 1);
        let names: Vec<_> = stats
            .triggers
            .iter()
            .map(|t| (t.trigger_id.as_str(), t.trigger_name.as_str(), t.failures))
            .collect();
        assert_eq!(names, vec![("retired", "", 0), ("scream", "Banshee Scream", 3)]);
    }

    #[rstest]
    #[case(StatsRepositoryError::connection("refused"), crate::domain::ErrorCode::ServiceUnavailable)]
    #[case(StatsRepositoryError::query("bad sql"), crate::domain::ErrorCode::InternalError)]
    fn repository_errors_map_to_domain_codes(
        #[case] error: StatsRepositoryError,
        #[case] expected: crate::domain::ErrorCode,
    ) {
        assert_eq!(Error::from(error).code(), expected);
    }
}
