//! Trigger model: what a dashboard button fires.
//!
//! Trigger kinds form a closed set. Records naming a kind this build does not
//! understand still load as [`TriggerKind::Unsupported`] so the rest of the
//! table stays usable. Dispatch then rejects them with a typed error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier unique within one trigger table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(String);

impl TriggerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TriggerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TriggerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Network location of a LAN-controlled light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightTarget {
    /// Host or IP address; the command port is supplied by the transport.
    pub address: String,
}

impl LightTarget {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// Static state applied by a set-state trigger.
///
/// A configured scene takes precedence over every other field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightTargetState {
    /// Brightness percentage, 1 to 100.
    pub brightness: Option<u8>,
    pub color: Option<RgbColor>,
    pub color_temperature_kelvin: Option<u32>,
    pub scene_id: Option<u32>,
}

/// Snapshot of a light's state captured before an effect runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightState {
    pub power: bool,
    pub brightness: u8,
    pub color: RgbColor,
    pub color_temperature_kelvin: u32,
}

/// Closed set of trigger kinds and their kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    /// Networked sound player or relay reached with a single keyed GET.
    HttpDevice { address: String, secret_key: String },
    /// Query a light's status; succeeds when it answers in time.
    LightStatus { light: LightTarget },
    /// Lightning storm effect with capture and restore.
    LightEffect { light: LightTarget },
    /// Apply a static state or scene to a light.
    LightSetState {
        light: LightTarget,
        target: LightTargetState,
    },
    /// A record whose `type` is not recognised.
    Unsupported { type_name: String },
}

/// Discriminant used to select an executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKindTag {
    HttpDevice,
    LightStatus,
    LightEffect,
    LightSetState,
    Unsupported,
}

impl TriggerKind {
    pub fn tag(&self) -> TriggerKindTag {
        match self {
            Self::HttpDevice { .. } => TriggerKindTag::HttpDevice,
            Self::LightStatus { .. } => TriggerKindTag::LightStatus,
            Self::LightEffect { .. } => TriggerKindTag::LightEffect,
            Self::LightSetState { .. } => TriggerKindTag::LightSetState,
            Self::Unsupported { .. } => TriggerKindTag::Unsupported,
        }
    }

    /// Public type label shown to dashboard clients.
    pub fn type_name(&self) -> &str {
        match self {
            Self::HttpDevice { .. } => "http_device",
            Self::LightStatus { .. } => "govee_status",
            Self::LightEffect { .. } => "govee_lightning",
            Self::LightSetState { .. } => "govee_set_state",
            Self::Unsupported { type_name } => type_name.as_str(),
        }
    }
}

/// A fireable remote effect as declared in the trigger table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub id: TriggerId,
    pub name: String,
    pub description: String,
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn new(id: impl Into<TriggerId>, name: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
