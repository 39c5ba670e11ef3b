//! Govee LAN API wire format.
//!
//! Every datagram is JSON of the form `{"msg":{"cmd":..,"data":..}}`.
//! Commands go to the device on UDP 4003; status replies come back to the
//! controller on UDP 4002.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::ports::DispatchError;
use crate::domain::{LightState, RgbColor};

/// Device port receiving control commands.
pub const DEFAULT_COMMAND_PORT: u16 = 4003;
/// Controller port receiving status replies.
pub const DEFAULT_LISTEN_PORT: u16 = 4002;

const STATUS_COMMAND: &str = "devStatus";

/// A control command understood by Govee LAN devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    Turn(bool),
    /// Brightness percentage, 1 to 100.
    Brightness(u8),
    /// Colour plus colour temperature; a non-zero temperature overrides the
    /// RGB value on devices that support it.
    ColorWc {
        color: RgbColor,
        color_temperature_kelvin: u32,
    },
    Scene(u32),
    DevStatus,
}

impl LightCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Turn(_) => "turn",
            Self::Brightness(_) => "brightness",
            Self::ColorWc { .. } => "colorwc",
            Self::Scene(_) => "scene",
            Self::DevStatus => STATUS_COMMAND,
        }
    }

    fn data(&self) -> Value {
        match self {
            Self::Turn(on) => json!({ "value": u8::from(*on) }),
            Self::Brightness(value) => json!({ "value": value }),
            Self::ColorWc {
                color,
                color_temperature_kelvin,
            } => json!({
                "color": { "r": color.r, "g": color.g, "b": color.b },
                "colorTemInKelvin": color_temperature_kelvin,
            }),
            Self::Scene(id) => json!({ "value": id }),
            Self::DevStatus => json!({}),
        }
    }

    /// Serialise the command into a datagram payload.
    pub fn encode(&self) -> Vec<u8> {
        json!({ "msg": { "cmd": self.name(), "data": self.data() } })
            .to_string()
            .into_bytes()
    }
}

#[derive(Deserialize)]
struct StatusEnvelope {
    msg: StatusMessage,
}

#[derive(Deserialize)]
struct StatusMessage {
    cmd: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct StatusData {
    #[serde(rename = "onOff")]
    on_off: u8,
    brightness: u8,
    #[serde(default)]
    color: StatusColor,
    #[serde(rename = "colorTemInKelvin", default)]
    color_temperature_kelvin: Option<u32>,
}

#[derive(Deserialize, Default)]
struct StatusColor {
    #[serde(default)]
    r: u8,
    #[serde(default)]
    g: u8,
    #[serde(default)]
    b: u8,
    #[serde(rename = "colorTemInKelvin", default)]
    color_temperature_kelvin: Option<u32>,
}

/// Decode a `devStatus` reply into a [`LightState`].
///
/// The colour temperature may appear at the top level of `data` or nested in
/// `color`; the top-level value wins.
///
/// # Errors
/// Returns [`DispatchError::MalformedReply`] for invalid JSON, a reply to a
/// different command, or a payload missing required fields.
pub fn decode_status(payload: &[u8]) -> Result<LightState, DispatchError> {
    let envelope: StatusEnvelope = serde_json::from_slice(payload)
        .map_err(|err| DispatchError::malformed_reply(format!("invalid status JSON: {err}")))?;
    if envelope.msg.cmd != STATUS_COMMAND {
        return Err(DispatchError::malformed_reply(format!(
            "expected {STATUS_COMMAND} reply, got '{}'",
            envelope.msg.cmd
        )));
    }
    let data: StatusData = serde_json::from_value(envelope.msg.data)
        .map_err(|err| DispatchError::malformed_reply(format!("invalid status data: {err}")))?;

    Ok(LightState {
        power: data.on_off != 0,
        brightness: data.brightness,
        color: RgbColor::new(data.color.r, data.color.g, data.color.b),
        color_temperature_kelvin: data
            .color_temperature_kelvin
            .or(data.color.color_temperature_kelvin)
            .unwrap_or(0),
    })
}
