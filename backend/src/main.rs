//! Dashboard entry point: loads settings, prepares the database and trigger
//! table, then serves the HTTP API.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use maze_dashboard::domain::TriggerRegistry;
use maze_dashboard::inbound::http::health::HealthState;
use maze_dashboard::inbound::http::session_config::{BuildMode, session_settings_from_env};
use maze_dashboard::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use maze_dashboard::outbound::trigger_config::{TriggerConfigWatcher, load_trigger_table};
use maze_dashboard::settings::DashboardSettings;

use server::{ServerConfig, build_http_state, create_server};

#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        DashboardSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let env = DefaultEnv::new();
    let session = session_settings_from_env(&env, BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    let database_url = settings.database_url()?;
    let bind_addr = settings.bind_addr()?;

    run_migrations(database_url)
        .await
        .wrap_err("database migrations failed")?;
    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.db_pool_size()))
        .await
        .wrap_err("failed to build database pool")?;

    let triggers_path = settings.triggers_path.clone();
    let table = load_trigger_table(&triggers_path)
        .await
        .wrap_err("failed to load trigger table")?;
    info!(path = %triggers_path.display(), count = table.len(), "trigger table loaded");
    let registry = Arc::new(TriggerRegistry::new(table));
    let watcher = TriggerConfigWatcher::spawn(triggers_path, Arc::clone(&registry))
        .wrap_err("failed to watch trigger table")?;

    let http_state = build_http_state(&settings, &pool, registry)
        .wrap_err("failed to build device clients")?;
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state.clone(),
        ServerConfig {
            bind_addr,
            session,
            http_state,
        },
    )?;
    info!(%bind_addr, "dashboard listening");

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "cannot listen for interrupts; graceful drain disabled");
            return;
        }
        info!("interrupt received; draining");
        health_state.begin_draining();
        handle.stop(true).await;
    });

    let result = server.await;
    watcher.abort();
    result.wrap_err("server terminated with an error")
}
