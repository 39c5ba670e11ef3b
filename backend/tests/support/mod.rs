//! Shared helpers for PostgreSQL-backed integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! helpers live here and are pulled in with `mod support;`. Each test gets a
//! fresh database on the shared embedded cluster from
//! `pg-embed-setup-unpriv`, so assertions may count every row they see.

mod cluster_skip;

use std::future::Future;

use maze_dashboard::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use tokio::runtime::Runtime;

use cluster_skip::handle_cluster_setup_failure;

/// A migrated temporary database with a pool and the runtime that drives it.
///
/// The pool is declared first so its connections close before the database
/// is dropped.
pub struct LedgerDb {
    pool: DbPool,
    runtime: Runtime,
    _database: TemporaryDatabase,
}

impl LedgerDb {
    /// Run an async test body against this database's pool.
    pub fn run<F, Fut>(&self, body: F)
    where
        F: FnOnce(DbPool) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.runtime.block_on(body(self.pool.clone()));
    }
}

/// Provision a [`LedgerDb`], deferring to the `SKIP_TEST_CLUSTER` policy when
/// the cluster cannot be reached.
///
/// Must be called outside any tokio runtime; cluster bootstrap blocks.
pub fn provision_ledger_db() -> Option<LedgerDb> {
    match try_provision() {
        Ok(db) => Some(db),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn try_provision() -> Result<LedgerDb, String> {
    debug_assert!(
        tokio::runtime::Handle::try_current().is_err(),
        "cluster bootstrap must run outside a tokio runtime"
    );
    let cluster = shared_cluster_handle().map_err(|err| err.to_string())?;
    let database_name = format!("ledger_test_{}", uuid::Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(database_name.as_str())
        .map_err(|err| err.to_string())?;
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let url = database.url().to_owned();

    runtime
        .block_on(run_migrations(&url))
        .map_err(|err| format!("migrations failed: {err}"))?;
    let pool = runtime
        .block_on(DbPool::new(PoolConfig::new(url).with_max_size(8)))
        .map_err(|err| format!("pool setup failed: {err}"))?;

    Ok(LedgerDb {
        pool,
        runtime,
        _database: database,
    })
}
