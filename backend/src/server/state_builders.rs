//! Builders wiring adapters into the handler state.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::warn;

use maze_dashboard::domain::{ActivationService, ExecutorSet, StatsService, TriggerRegistry};
use maze_dashboard::inbound::http::admin::AdminSecret;
use maze_dashboard::inbound::http::state::HttpState;
use maze_dashboard::outbound::devices::HttpDeviceExecutor;
use maze_dashboard::outbound::devices::govee::{
    LightSetStateExecutor, LightStatusExecutor, LightTransport, LightningExecutor,
    LightningSettings, UdpLightTransport, UdpTransportConfig,
};
use maze_dashboard::outbound::persistence::{
    DbPool, DieselStatsRepository, DieselTokenLedger, DieselUserRepository,
};
use maze_dashboard::settings::{DashboardSettings, FALLBACK_ADMIN_SECRET};

/// One executor per trigger kind, sharing a single UDP transport.
///
/// # Errors
/// Fails when the HTTP client cannot be constructed.
pub(crate) fn build_executors(settings: &DashboardSettings) -> Result<ExecutorSet, reqwest::Error> {
    let transport: Arc<dyn LightTransport> =
        Arc::new(UdpLightTransport::new(UdpTransportConfig {
            command_port: settings.govee_command_port,
            listen_port: settings.govee_listen_port,
            status_timeout: settings.govee_status_timeout(),
        }));
    let lightning = LightningSettings::default().with_duration(settings.lightning_duration());
    let command_spacing = lightning.command_spacing;

    Ok(ExecutorSet {
        http_device: Arc::new(HttpDeviceExecutor::new(settings.http_timeout())?),
        light_status: Arc::new(LightStatusExecutor::new(Arc::clone(&transport))),
        light_effect: Arc::new(LightningExecutor::new(Arc::clone(&transport), lightning)),
        light_set_state: Arc::new(LightSetStateExecutor::new(transport, command_spacing)),
    })
}

fn admin_secret(settings: &DashboardSettings) -> AdminSecret {
    match settings.admin_secret() {
        Some(secret) => AdminSecret::new(secret),
        None => {
            warn!("DASHBOARD_ADMIN_SECRET not set; using the built-in fallback secret");
            AdminSecret::new(FALLBACK_ADMIN_SECRET)
        }
    }
}

/// Build handler state backed by PostgreSQL and real device clients.
///
/// # Errors
/// Fails when the HTTP device client cannot be constructed.
pub(crate) fn build_http_state(
    settings: &DashboardSettings,
    pool: &DbPool,
    registry: Arc<TriggerRegistry>,
) -> Result<HttpState, reqwest::Error> {
    let executors = Arc::new(build_executors(settings)?);
    let ledger = Arc::new(DieselTokenLedger::new(pool.clone()));
    let stats = StatsService::new(
        Arc::new(DieselStatsRepository::new(pool.clone())),
        Arc::clone(&registry),
        Arc::new(DefaultClock),
    )
    .with_window_minutes(settings.stats_window_minutes());

    Ok(HttpState {
        triggers: Arc::clone(&registry),
        activation: Arc::new(ActivationService::new(registry, ledger.clone(), executors)),
        ledger,
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        stats: Arc::new(stats),
        admin_secret: Arc::new(admin_secret(settings)),
        default_tokens: settings.default_tokens,
    })
}
