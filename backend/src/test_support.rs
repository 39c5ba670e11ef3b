//! Test doubles shared by unit and integration tests.
//!
//! Exposed publicly only with the `test-support` feature.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, Local, TimeDelta, Utc};
use mockable::Clock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::domain::ports::{
    DebitReceipt, DispatchError, MinuteBucket, StatsRepository, StatsRepositoryError, StoreTotals,
    TokenLedger, TokenLedgerError, TriggerExecutor, TriggerOutcomeCounts, UserActivity,
    UserRepository, UserStoreError,
};
use crate::domain::{ActionId, Trigger, TriggerId, User, UserId};

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}"),
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// A logged activation as held by [`InMemoryDashboardStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub id: ActionId,
    pub user_id: UserId,
    pub trigger_id: TriggerId,
    pub occurred_at: DateTime<Utc>,
    pub success: bool,
}

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    actions: Vec<ActionRecord>,
    recharges: Vec<(UserId, DateTime<Utc>)>,
    next_action_id: i64,
}

/// In-memory stand-in for the relational store.
///
/// Implements the ledger, user and statistics ports with the same semantics
/// as the Diesel adapters. One mutex guards all state so each call behaves
/// like a transaction.
pub struct InMemoryDashboardStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Default for InMemoryDashboardStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(mockable::DefaultClock))
    }
}

impl InMemoryDashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("store mutex"),
        }
    }

    /// Insert a user directly, bypassing the port.
    pub fn seed_user(&self, is_admin: bool, tokens: u32) -> User {
        let user = User {
            id: UserId::random(),
            tokens_remaining: tokens,
            is_admin,
            created_at: self.clock.utc(),
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    pub fn balance(&self, user_id: &UserId) -> Option<u32> {
        self.lock().users.get(user_id).map(|user| user.tokens_remaining)
    }

    pub fn actions(&self) -> Vec<ActionRecord> {
        self.lock().actions.clone()
    }

    pub fn recharge_count(&self, user_id: &UserId) -> usize {
        self.lock()
            .recharges
            .iter()
            .filter(|(id, _)| id == user_id)
            .count()
    }
}

#[async_trait]
impl TokenLedger for InMemoryDashboardStore {
    async fn debit_and_record_pending(
        &self,
        user_id: &UserId,
        trigger_id: &TriggerId,
    ) -> Result<DebitReceipt, TokenLedgerError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| TokenLedgerError::user_not_found(user_id.to_string()))?;
        let charged = if user.is_admin {
            false
        } else if user.tokens_remaining == 0 {
            return Err(TokenLedgerError::insufficient_tokens());
        } else {
            user.tokens_remaining -= 1;
            true
        };

        state.next_action_id += 1;
        let action_id = ActionId::new(state.next_action_id);
        state.actions.push(ActionRecord {
            id: action_id,
            user_id: *user_id,
            trigger_id: trigger_id.clone(),
            occurred_at: now,
            success: false,
        });
        Ok(DebitReceipt { action_id, charged })
    }

    async fn credit_one(&self, user_id: &UserId) -> Result<(), TokenLedgerError> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| TokenLedgerError::user_not_found(user_id.to_string()))?;
        user.tokens_remaining += 1;
        Ok(())
    }

    async fn mark_action_success(&self, action_id: ActionId) -> Result<(), TokenLedgerError> {
        let mut state = self.lock();
        let action = state
            .actions
            .iter_mut()
            .find(|action| action.id == action_id)
            .ok_or_else(|| TokenLedgerError::storage(format!("action {action_id} not found")))?;
        action.success = true;
        Ok(())
    }

    async fn recharge(&self, user_id: &UserId, allotment: u32) -> Result<User, TokenLedgerError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| TokenLedgerError::user_not_found(user_id.to_string()))?;
        user.tokens_remaining = allotment;
        let updated = user.clone();
        state.recharges.push((*user_id, now));
        Ok(updated)
    }
}

#[async_trait]
impl UserRepository for InMemoryDashboardStore {
    async fn create(&self, is_admin: bool, tokens: u32) -> Result<User, UserStoreError> {
        Ok(self.seed_user(is_admin, tokens))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        Ok(self.lock().users.get(id).cloned())
    }
}

#[async_trait]
impl StatsRepository for InMemoryDashboardStore {
    async fn totals(&self) -> Result<StoreTotals, StatsRepositoryError> {
        let state = self.lock();
        Ok(StoreTotals {
            users: state.users.len() as u64,
            recharges: state.recharges.len() as u64,
        })
    }

    async fn trigger_outcomes(&self) -> Result<Vec<TriggerOutcomeCounts>, StatsRepositoryError> {
        let state = self.lock();
        let mut counts: Vec<TriggerOutcomeCounts> = Vec::new();
        for action in &state.actions {
            let is_admin = state
                .users
                .get(&action.user_id)
                .is_some_and(|user| user.is_admin);
            let index = match counts
                .iter()
                .position(|entry| entry.trigger_id == action.trigger_id)
            {
                Some(index) => index,
                None => {
                    counts.push(TriggerOutcomeCounts {
                        trigger_id: action.trigger_id.clone(),
                        public_successes: 0,
                        admin_successes: 0,
                        public_failures: 0,
                        admin_failures: 0,
                    });
                    counts.len() - 1
                }
            };
            let Some(entry) = counts.get_mut(index) else {
                continue;
            };
            match (is_admin, action.success) {
                (false, true) => entry.public_successes += 1,
                (true, true) => entry.admin_successes += 1,
                (false, false) => entry.public_failures += 1,
                (true, false) => entry.admin_failures += 1,
            }
        }
        Ok(counts)
    }

    async fn activations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MinuteBucket>, StatsRepositoryError> {
        let state = self.lock();
        let mut buckets: Vec<MinuteBucket> = Vec::new();
        for action in state.actions.iter().filter(|action| action.occurred_at >= since) {
            let minute = action
                .occurred_at
                .duration_trunc(TimeDelta::minutes(1))
                .map_err(|err| StatsRepositoryError::query(err.to_string()))?;
            let is_admin = state
                .users
                .get(&action.user_id)
                .is_some_and(|user| user.is_admin);
            let index = match buckets.iter().position(|bucket| bucket.minute == minute) {
                Some(index) => index,
                None => {
                    buckets.push(MinuteBucket {
                        minute,
                        public_count: 0,
                        admin_count: 0,
                    });
                    buckets.len() - 1
                }
            };
            let Some(bucket) = buckets.get_mut(index) else {
                continue;
            };
            if is_admin {
                bucket.admin_count += 1;
            } else {
                bucket.public_count += 1;
            }
        }
        buckets.sort_by_key(|bucket| bucket.minute);
        Ok(buckets)
    }

    async fn user_activity(&self) -> Result<Vec<UserActivity>, StatsRepositoryError> {
        let state = self.lock();
        let mut activity: Vec<UserActivity> = state
            .users
            .values()
            .map(|user| UserActivity {
                user_id: user.id,
                created_at: user.created_at,
                is_admin: user.is_admin,
                actions: state
                    .actions
                    .iter()
                    .filter(|action| action.user_id == user.id)
                    .count() as u64,
            })
            .collect();
        activity.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(activity)
    }
}

/// Executor returning a fixed result and counting how often it ran.
pub struct ScriptedExecutor {
    result: Result<(), DispatchError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn succeeding() -> Self {
        Self::with_result(Ok(()))
    }

    pub fn failing(error: DispatchError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<(), DispatchError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering, to model a slow device.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TriggerExecutor for ScriptedExecutor {
    async fn execute(&self, _trigger: &Trigger) -> Result<(), DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

/// Single-shot HTTP device answering one request with a fixed status.
pub struct FakeHttpDevice {
    pub address: SocketAddr,
    request: JoinHandle<Option<String>>,
}

impl FakeHttpDevice {
    /// Request line of the call the device received, if any.
    pub async fn request_line(self) -> Option<String> {
        self.request.await.ok().flatten()
    }
}

/// Start a [`FakeHttpDevice`] on an ephemeral localhost port.
pub async fn spawn_http_device(status: u16) -> FakeHttpDevice {
    let listener = match TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(error) => panic!("bind fake device: {error}"),
    };
    let address = match listener.local_addr() {
        Ok(address) => address,
        Err(error) => panic!("fake device address: {error}"),
    };
    let request = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.ok()?;
        let mut received = Vec::new();
        let mut chunk = [0_u8; 1024];
        while !received.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            received.extend_from_slice(chunk.get(..read)?);
        }
        let response =
            format!("HTTP/1.1 {status} Scripted\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        stream.write_all(response.as_bytes()).await.ok()?;
        stream.shutdown().await.ok()?;
        String::from_utf8_lossy(&received)
            .lines()
            .next()
            .map(str::to_owned)
    });
    FakeHttpDevice { address, request }
}
