//! Device protocol clients implementing [`TriggerExecutor`] for each trigger
//! kind.
//!
//! - **http_device**: one keyed GET per activation
//! - **govee**: UDP LAN control for status, lightning and set-state triggers
//!
//! [`TriggerExecutor`]: crate::domain::ports::TriggerExecutor

pub mod govee;
mod http_device;

pub use http_device::{DEFAULT_HTTP_DEVICE_TIMEOUT, HttpDeviceExecutor};
