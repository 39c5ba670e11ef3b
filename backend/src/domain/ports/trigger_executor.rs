//! Port for firing a trigger against its physical device.
use async_trait::async_trait;

use crate::domain::Trigger;

use super::define_port_error;

define_port_error! {
    /// Reasons a dispatch attempt failed. Each one refunds a charged token.
    pub enum DispatchError {
        /// The request never completed (connect, send or read failure).
        Transport { message: String } => "device transport failed: {message}",
        /// The device answered with an error status.
        DeviceStatus { status: u16 } => "device answered with status {status}",
        /// No answer arrived before the deadline.
        Timeout { operation: String } => "device timed out during {operation}",
        /// The device answered with something we could not interpret.
        MalformedReply { message: String } => "malformed device reply: {message}",
        /// The trigger table named a kind this build cannot dispatch.
        UnknownTriggerType { type_name: String } => "unknown trigger type '{type_name}'",
        /// The trigger's parameters do not suit the selected executor.
        Misconfigured { message: String } => "trigger misconfigured: {message}",
    }
}

/// Executes one trigger kind. Implementations make at most one attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TriggerExecutor: Send + Sync {
    async fn execute(&self, trigger: &Trigger) -> Result<(), DispatchError>;
}
