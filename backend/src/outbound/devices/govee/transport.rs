//! UDP transport for Govee LAN lights.
//!
//! Two primitives with different guarantees: [`LightTransport::send`] is
//! fire-and-forget, [`LightTransport::query_status`] waits for exactly one
//! reply under a hard deadline. Status queries share the controller's reply
//! port, so they are serialised per transport.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use super::protocol::{DEFAULT_COMMAND_PORT, DEFAULT_LISTEN_PORT, LightCommand, decode_status};
use crate::domain::LightState;
use crate::domain::ports::DispatchError;

/// Default deadline for a status reply.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(3);

const MAX_DATAGRAM: usize = 2048;

/// Command channel to LAN lights, addressed by host.
#[async_trait]
pub trait LightTransport: Send + Sync {
    /// Send one command without waiting for acknowledgement.
    async fn send(&self, address: &str, command: LightCommand) -> Result<(), DispatchError>;

    /// Ask a light for its state and wait for the reply.
    async fn query_status(&self, address: &str) -> Result<LightState, DispatchError>;
}

/// Port and deadline settings for [`UdpLightTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpTransportConfig {
    pub command_port: u16,
    /// Local port bound for status replies; `0` picks an ephemeral port.
    pub listen_port: u16,
    pub status_timeout: Duration,
}

impl Default for UdpTransportConfig {
    fn default() -> Self {
        Self {
            command_port: DEFAULT_COMMAND_PORT,
            listen_port: DEFAULT_LISTEN_PORT,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

/// [`LightTransport`] over plain UDP sockets.
pub struct UdpLightTransport {
    config: UdpTransportConfig,
    status_gate: Mutex<()>,
}

impl UdpLightTransport {
    pub fn new(config: UdpTransportConfig) -> Self {
        Self {
            config,
            status_gate: Mutex::new(()),
        }
    }

    async fn resolve(&self, address: &str) -> Result<SocketAddr, DispatchError> {
        lookup_host((address, self.config.command_port))
            .await
            .map_err(|err| DispatchError::transport(format!("cannot resolve {address}: {err}")))?
            .next()
            .ok_or_else(|| DispatchError::transport(format!("no address for {address}")))
    }
}

fn unspecified_for(target: &SocketAddr) -> SocketAddr {
    match target.ip() {
        IpAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        IpAddr::V6(_) => SocketAddr::from(([0_u16; 8], 0)),
    }
}

#[async_trait]
impl LightTransport for UdpLightTransport {
    async fn send(&self, address: &str, command: LightCommand) -> Result<(), DispatchError> {
        let target = self.resolve(address).await?;
        let socket = UdpSocket::bind(unspecified_for(&target))
            .await
            .map_err(|err| DispatchError::transport(format!("cannot bind command socket: {err}")))?;
        debug!(%target, cmd = command.name(), "sending light command");
        socket
            .send_to(&command.encode(), target)
            .await
            .map_err(|err| DispatchError::transport(format!("send to {target} failed: {err}")))?;
        Ok(())
    }

    async fn query_status(&self, address: &str) -> Result<LightState, DispatchError> {
        let target = self.resolve(address).await?;
        let _gate = self.status_gate.lock().await;

        let mut bind_addr = unspecified_for(&target);
        bind_addr.set_port(self.config.listen_port);
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|err| DispatchError::transport(format!("cannot bind reply port: {err}")))?;
        socket
            .send_to(&LightCommand::DevStatus.encode(), target)
            .await
            .map_err(|err| DispatchError::transport(format!("status query to {target} failed: {err}")))?;

        let deadline = Instant::now() + self.config.status_timeout;
        let mut buffer = [0_u8; MAX_DATAGRAM];
        loop {
            let (len, from) = timeout_at(deadline, socket.recv_from(&mut buffer))
                .await
                .map_err(|_| DispatchError::timeout("status query"))?
                .map_err(|err| DispatchError::transport(format!("status receive failed: {err}")))?;
            if from.ip() != target.ip() {
                debug!(%from, %target, "ignoring datagram from another host");
                continue;
            }
            let payload = buffer.get(..len).unwrap_or_default();
            return decode_status(payload);
        }
    }
}
