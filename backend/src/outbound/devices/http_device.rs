//! Reqwest-backed executor for keyed HTTP devices.
//!
//! One GET to `http://{address}/trigger?key={secret}` per activation, bounded
//! by the client timeout. Any status below 400 counts as fired; redirects are
//! not followed. No retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, redirect};
use tracing::{debug, info};

use crate::domain::ports::{DispatchError, TriggerExecutor};
use crate::domain::{Trigger, TriggerKind};

/// Default bound on a whole device request.
pub const DEFAULT_HTTP_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

/// Executor for [`TriggerKind::HttpDevice`] triggers.
pub struct HttpDeviceExecutor {
    client: Client,
}

impl HttpDeviceExecutor {
    /// Build an executor whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TriggerExecutor for HttpDeviceExecutor {
    async fn execute(&self, trigger: &Trigger) -> Result<(), DispatchError> {
        let TriggerKind::HttpDevice {
            address,
            secret_key,
        } = &trigger.kind
        else {
            return Err(DispatchError::misconfigured(format!(
                "trigger {} is not an HTTP device",
                trigger.id
            )));
        };

        let url = trigger_url(address, secret_key)?;
        debug!(trigger_id = %trigger.id, host = %address, "calling http device");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(map_status_error(status));
        }
        info!(trigger_id = %trigger.id, status = status.as_u16(), "http device fired");
        Ok(())
    }
}

fn trigger_url(address: &str, secret_key: &str) -> Result<Url, DispatchError> {
    let mut url = Url::parse(&format!("http://{address}/trigger"))
        .map_err(|err| DispatchError::misconfigured(format!("invalid device address '{address}': {err}")))?;
    url.query_pairs_mut().append_pair("key", secret_key);
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> DispatchError {
    if error.is_timeout() {
        DispatchError::timeout("http device request")
    } else {
        DispatchError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode) -> DispatchError {
    DispatchError::device_status(status.as_u16())
}
