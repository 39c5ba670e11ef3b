//! DTOs for decoding the trigger table file.
//!
//! Records are flat: every kind's parameters live side by side and `type`
//! decides which ones matter.

use serde::Deserialize;

use crate::domain::{LightTarget, LightTargetState, RgbColor, Trigger, TriggerKind};

#[derive(Debug, Deserialize)]
pub(super) struct TriggerFileDto {
    #[serde(default)]
    pub(super) triggers: Vec<TriggerRecordDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct TriggerRecordDto {
    pub(super) id: String,
    pub(super) name: String,
    pub(super) description: String,
    #[serde(rename = "type")]
    pub(super) kind: String,
    pub(super) arduino_ip: Option<String>,
    pub(super) secret_key: String,
    pub(super) govee_device_ip: Option<String>,
    pub(super) govee_color: Option<ColorDto>,
    pub(super) govee_color_temp: Option<u32>,
    pub(super) govee_brightness: Option<i64>,
    pub(super) govee_scene_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct ColorDto {
    r: u8,
    g: u8,
    b: u8,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TriggerRecordDto {
    pub(super) fn into_domain(self) -> Result<Trigger, String> {
        if self.id.trim().is_empty() {
            return Err(format!("trigger '{}' has an empty id", self.name));
        }
        let kind = match self.kind.as_str() {
            "" | "arduino" | "http_device" => {
                let address = non_empty(self.arduino_ip)
                    .ok_or_else(|| format!("trigger {} is missing arduino_ip", self.id))?;
                TriggerKind::HttpDevice {
                    address,
                    secret_key: self.secret_key,
                }
            }
            "govee_status" => TriggerKind::LightStatus {
                light: light_target(&self.id, self.govee_device_ip)?,
            },
            "govee_lightning" => TriggerKind::LightEffect {
                light: light_target(&self.id, self.govee_device_ip)?,
            },
            "govee_set_state" => TriggerKind::LightSetState {
                light: light_target(&self.id, self.govee_device_ip)?,
                target: LightTargetState {
                    brightness: self
                        .govee_brightness
                        .map(|value| u8::try_from(value.clamp(1, 100)).unwrap_or(100)),
                    color: self.govee_color.map(|c| RgbColor::new(c.r, c.g, c.b)),
                    color_temperature_kelvin: self.govee_color_temp.filter(|k| *k > 0),
                    scene_id: self.govee_scene_id,
                },
            },
            other => TriggerKind::Unsupported {
                type_name: other.to_owned(),
            },
        };

        Ok(Trigger::new(self.id, self.name, kind).with_description(self.description))
    }
}

fn light_target(id: &str, address: Option<String>) -> Result<LightTarget, String> {
    non_empty(address)
        .map(LightTarget::new)
        .ok_or_else(|| format!("trigger {id} is missing govee_device_ip"))
}
