//! Govee LAN lights over UDP.

mod effects;
pub mod protocol;
mod transport;

pub use effects::{
    FLASH_COLOR, LightSetStateExecutor, LightStatusExecutor, LightningExecutor, LightningSettings,
};
pub use protocol::{DEFAULT_COMMAND_PORT, DEFAULT_LISTEN_PORT, LightCommand};
pub use transport::{DEFAULT_STATUS_TIMEOUT, LightTransport, UdpLightTransport, UdpTransportConfig};
