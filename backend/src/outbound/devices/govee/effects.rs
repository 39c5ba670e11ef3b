//! Executors for LAN light triggers.
//!
//! The lightning effect captures the light's state, flickers it for a fixed
//! window and then restores what it captured. Capture failure aborts before
//! any command is sent. Flicker and restore failures are logged; once capture
//! succeeds the activation counts as fired.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use super::protocol::LightCommand;
use super::transport::LightTransport;
use crate::domain::ports::{DispatchError, TriggerExecutor};
use crate::domain::{LightState, LightTarget, LightTargetState, RgbColor, Trigger, TriggerKind};

/// Bluish white used for the flashes.
pub const FLASH_COLOR: RgbColor = RgbColor::new(200, 200, 255);
const FLASH_HIGH_BRIGHTNESS: u8 = 100;
const FLASH_LOW_BRIGHTNESS: u8 = 1;
const WHITE: RgbColor = RgbColor::new(255, 255, 255);

/// Timing of the lightning effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightningSettings {
    /// Length of the flicker phase.
    pub duration: Duration,
    /// How long each bright flash holds.
    pub flash_high: RangeInclusive<Duration>,
    /// How long the dark gap between flashes holds.
    pub flash_low: RangeInclusive<Duration>,
    /// Gap between the sequential restore commands.
    pub command_spacing: Duration,
}

impl Default for LightningSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            flash_high: Duration::from_millis(50)..=Duration::from_millis(150),
            flash_low: Duration::from_millis(80)..=Duration::from_millis(380),
            command_spacing: Duration::from_millis(100),
        }
    }
}

impl LightningSettings {
    /// Override the flicker window, keeping the default jitter.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

fn jitter(range: &RangeInclusive<Duration>) -> Duration {
    if range.start() >= range.end() {
        return *range.start();
    }
    rand::thread_rng().gen_range(range.clone())
}

fn light_of<'a>(trigger: &'a Trigger, expected: &str) -> Result<&'a LightTarget, DispatchError> {
    match &trigger.kind {
        TriggerKind::LightStatus { light }
        | TriggerKind::LightEffect { light }
        | TriggerKind::LightSetState { light, .. } => Ok(light),
        _ => Err(DispatchError::misconfigured(format!(
            "trigger {} is not a {expected} trigger",
            trigger.id
        ))),
    }
}

/// Succeeds when the light answers a status query in time.
pub struct LightStatusExecutor {
    transport: Arc<dyn LightTransport>,
}

impl LightStatusExecutor {
    pub fn new(transport: Arc<dyn LightTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TriggerExecutor for LightStatusExecutor {
    async fn execute(&self, trigger: &Trigger) -> Result<(), DispatchError> {
        let light = light_of(trigger, "light status")?;
        let state = self.transport.query_status(&light.address).await?;
        info!(
            trigger_id = %trigger.id,
            power = state.power,
            brightness = state.brightness,
            "light answered status query"
        );
        Ok(())
    }
}

/// Capture, flicker, restore.
pub struct LightningExecutor {
    transport: Arc<dyn LightTransport>,
    settings: LightningSettings,
}

impl LightningExecutor {
    pub fn new(transport: Arc<dyn LightTransport>, settings: LightningSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Send a command whose failure must not abort the effect.
    async fn send_logged(&self, address: &str, command: LightCommand) -> bool {
        match self.transport.send(address, command).await {
            Ok(()) => true,
            Err(error) => {
                warn!(%address, cmd = command.name(), %error, "light command failed");
                false
            }
        }
    }

    async fn flicker(&self, address: &str) {
        self.send_logged(
            address,
            LightCommand::ColorWc {
                color: FLASH_COLOR,
                color_temperature_kelvin: 0,
            },
        )
        .await;
        sleep(self.settings.command_spacing).await;

        let deadline = Instant::now() + self.settings.duration;
        while Instant::now() < deadline {
            self.send_logged(address, LightCommand::Brightness(FLASH_HIGH_BRIGHTNESS))
                .await;
            sleep(jitter(&self.settings.flash_high)).await;
            self.send_logged(address, LightCommand::Brightness(FLASH_LOW_BRIGHTNESS))
                .await;
            sleep(jitter(&self.settings.flash_low)).await;
        }
    }

    /// Restore in order: power, brightness, then colour or temperature.
    async fn restore(&self, address: &str, captured: LightState) -> usize {
        let commands = [
            LightCommand::Turn(captured.power),
            LightCommand::Brightness(captured.brightness),
            LightCommand::ColorWc {
                color: captured.color,
                color_temperature_kelvin: captured.color_temperature_kelvin,
            },
        ];
        let mut failures = 0;
        for (index, command) in commands.into_iter().enumerate() {
            if index > 0 {
                sleep(self.settings.command_spacing).await;
            }
            if !self.send_logged(address, command).await {
                failures += 1;
            }
        }
        failures
    }
}

#[async_trait]
impl TriggerExecutor for LightningExecutor {
    async fn execute(&self, trigger: &Trigger) -> Result<(), DispatchError> {
        let light = light_of(trigger, "lightning")?;
        let captured = self.transport.query_status(&light.address).await?;

        self.flicker(&light.address).await;
        let failures = self.restore(&light.address, captured).await;
        if failures > 0 {
            warn!(
                trigger_id = %trigger.id,
                failures,
                "light only partially restored after lightning"
            );
        } else {
            info!(trigger_id = %trigger.id, "lightning finished and light restored");
        }
        Ok(())
    }
}

/// Applies a scene or a static power/brightness/colour state.
pub struct LightSetStateExecutor {
    transport: Arc<dyn LightTransport>,
    command_spacing: Duration,
}

impl LightSetStateExecutor {
    pub fn new(transport: Arc<dyn LightTransport>, command_spacing: Duration) -> Self {
        Self {
            transport,
            command_spacing,
        }
    }

    fn plan(target: &LightTargetState) -> Vec<LightCommand> {
        if let Some(scene) = target.scene_id {
            return vec![LightCommand::Scene(scene)];
        }
        let mut commands = vec![LightCommand::Turn(true)];
        if let Some(brightness) = target.brightness {
            commands.push(LightCommand::Brightness(brightness.clamp(1, 100)));
        }
        // A non-zero temperature overrides RGB on the device, so a colour
        // always goes out with the temperature zeroed.
        match (target.color, target.color_temperature_kelvin) {
            (Some(color), _) => commands.push(LightCommand::ColorWc {
                color,
                color_temperature_kelvin: 0,
            }),
            (None, Some(kelvin)) => commands.push(LightCommand::ColorWc {
                color: WHITE,
                color_temperature_kelvin: kelvin,
            }),
            (None, None) => {}
        }
        commands
    }
}

#[async_trait]
impl TriggerExecutor for LightSetStateExecutor {
    async fn execute(&self, trigger: &Trigger) -> Result<(), DispatchError> {
        let TriggerKind::LightSetState { light, target } = &trigger.kind else {
            return Err(DispatchError::misconfigured(format!(
                "trigger {} is not a set-state trigger",
                trigger.id
            )));
        };
        for (index, command) in Self::plan(target).into_iter().enumerate() {
            if index > 0 {
                sleep(self.command_spacing).await;
            }
            self.transport.send(&light.address, command).await?;
        }
        info!(trigger_id = %trigger.id, "light state applied");
        Ok(())
    }
}

#[cfg(test)]
#[path = "effects_tests.rs"]
mod tests;
