//! Routes a trigger to the executor for its kind.

use std::sync::Arc;

use async_trait::async_trait;

use super::ports::{DispatchError, TriggerExecutor};
use super::{Trigger, TriggerKind, TriggerKindTag};

/// One executor per supported trigger kind.
///
/// Implements [`TriggerExecutor`] itself so the orchestrator depends on a
/// single port regardless of how many protocols are wired in.
#[derive(Clone)]
pub struct ExecutorSet {
    pub http_device: Arc<dyn TriggerExecutor>,
    pub light_status: Arc<dyn TriggerExecutor>,
    pub light_effect: Arc<dyn TriggerExecutor>,
    pub light_set_state: Arc<dyn TriggerExecutor>,
}

impl ExecutorSet {
    /// Pick the executor for a kind. `None` for kinds with no executor.
    pub fn select(&self, tag: TriggerKindTag) -> Option<&Arc<dyn TriggerExecutor>> {
        match tag {
            TriggerKindTag::HttpDevice => Some(&self.http_device),
            TriggerKindTag::LightStatus => Some(&self.light_status),
            TriggerKindTag::LightEffect => Some(&self.light_effect),
            TriggerKindTag::LightSetState => Some(&self.light_set_state),
            TriggerKindTag::Unsupported => None,
        }
    }
}

#[async_trait]
impl TriggerExecutor for ExecutorSet {
    async fn execute(&self, trigger: &Trigger) -> Result<(), DispatchError> {
        match self.select(trigger.kind.tag()) {
            Some(executor) => executor.execute(trigger).await,
            None => Err(DispatchError::unknown_trigger_type(unsupported_name(
                &trigger.kind,
            ))),
        }
    }
}

fn unsupported_name(kind: &TriggerKind) -> String {
    match kind {
        TriggerKind::Unsupported { type_name } => type_name.clone(),
        other => other.type_name().to_owned(),
    }
}
