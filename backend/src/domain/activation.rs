//! Activation orchestrator.
//!
//! Turns "caller wants trigger X" into: registry lookup, one ledger
//! transaction that debits and logs a pending action, then a detached dispatch
//! task that records success or refunds the token.
//!
//! ```text
//! Requested -> NotFound                   (no ledger call)
//! Requested -> Denied                     (balance zero, nothing charged)
//! Requested -> Debited+Logged -> Dispatched -> Succeeded
//!                                          -> Failed -> Refunded (if charged)
//! ```
//!
//! Dispatch outlives the request. Dropping the [`DispatchHandle`] does not
//! cancel it; an effect that has started always runs to completion.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::ports::{
    DebitReceipt, DispatchError, TokenLedger, TokenLedgerError, TriggerExecutor,
    define_port_error,
};
use super::{ActionId, Caller, Error, TraceId, Trigger, TriggerId, TriggerRegistry};

define_port_error! {
    /// Failures that prevent an activation from being accepted.
    pub enum ActivationError {
        /// The session refers to a user the store does not know.
        UserNotFound { user_id: String } => "user {user_id} not found",
        /// The store could not be reached.
        StoreUnavailable { message: String } => "activation store unavailable: {message}",
        /// The debit transaction failed and was rolled back.
        Storage { message: String } => "activation storage failed: {message}",
    }
}

impl From<ActivationError> for Error {
    fn from(value: ActivationError) -> Self {
        match value {
            ActivationError::UserNotFound { .. } => {
                Error::unauthorized("invalid session, please refresh")
            }
            ActivationError::StoreUnavailable { .. } => {
                Error::service_unavailable("activation store unavailable")
            }
            ActivationError::Storage { message } => Error::internal(message),
        }
    }
}

/// Result of an accepted activation request.
#[derive(Debug)]
pub enum ActivationOutcome {
    /// Debited and logged; dispatch is running in the background.
    Initiated(ActivationTicket),
    /// A public caller has no tokens left. Nothing was charged or logged.
    InsufficientTokens,
    /// No trigger with that id in the current table.
    NotFound,
}

/// Receipt for an initiated activation.
#[derive(Debug)]
pub struct ActivationTicket {
    pub action_id: ActionId,
    pub charged: bool,
    pub dispatch: DispatchHandle,
}

/// How a dispatched activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResolution {
    Succeeded,
    Failed {
        error: DispatchError,
        /// Whether a token was returned to the caller.
        refunded: bool,
    },
    /// The dispatch task panicked; its action stays unresolved.
    Abandoned,
}

/// Handle to a detached dispatch task.
#[derive(Debug)]
pub struct DispatchHandle(JoinHandle<DispatchResolution>);

impl DispatchHandle {
    /// Wait for the dispatch to resolve.
    pub async fn wait(self) -> DispatchResolution {
        match self.0.await {
            Ok(resolution) => resolution,
            Err(join_error) => {
                error!(error = %join_error, "activation dispatch task did not complete");
                DispatchResolution::Abandoned
            }
        }
    }
}

/// Coordinates registry, ledger and executors for one activation at a time.
#[derive(Clone)]
pub struct ActivationService {
    registry: Arc<TriggerRegistry>,
    ledger: Arc<dyn TokenLedger>,
    executor: Arc<dyn TriggerExecutor>,
}

impl ActivationService {
    pub fn new(
        registry: Arc<TriggerRegistry>,
        ledger: Arc<dyn TokenLedger>,
        executor: Arc<dyn TriggerExecutor>,
    ) -> Self {
        Self {
            registry,
            ledger,
            executor,
        }
    }

    /// Accept or reject an activation and, when accepted, start dispatch.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`ActivationError`] when the caller is unknown to the store or
    /// the debit transaction fails.
    pub async fn activate(
        &self,
        caller: &Caller,
        trigger_id: &TriggerId,
    ) -> Result<ActivationOutcome, ActivationError> {
        // Registry lock is released here, before any store round trip.
        let Some(trigger) = self.registry.find(trigger_id) else {
            info!(trigger_id = %trigger_id, user_id = %caller.user_id, "activation for unknown trigger");
            return Ok(ActivationOutcome::NotFound);
        };

        let receipt = match self
            .ledger
            .debit_and_record_pending(&caller.user_id, trigger_id)
            .await
        {
            Ok(receipt) => receipt,
            Err(TokenLedgerError::InsufficientTokens) => {
                info!(trigger_id = %trigger_id, user_id = %caller.user_id, "activation denied: no tokens");
                return Ok(ActivationOutcome::InsufficientTokens);
            }
            Err(err) => return Err(map_ledger_error(err)),
        };

        info!(
            trigger_id = %trigger_id,
            user_id = %caller.user_id,
            action_id = %receipt.action_id,
            charged = receipt.charged,
            kind = trigger.kind.type_name(),
            "activation initiated"
        );

        let job = DispatchJob {
            trigger,
            caller: *caller,
            receipt,
            ledger: Arc::clone(&self.ledger),
            executor: Arc::clone(&self.executor),
        };
        let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
        let handle = tokio::spawn(TraceId::scope(trace_id, job.run()));

        Ok(ActivationOutcome::Initiated(ActivationTicket {
            action_id: receipt.action_id,
            charged: receipt.charged,
            dispatch: DispatchHandle(handle),
        }))
    }
}

fn map_ledger_error(error: TokenLedgerError) -> ActivationError {
    match error {
        TokenLedgerError::UserNotFound { user_id } => ActivationError::user_not_found(user_id),
        TokenLedgerError::Connection { message } => ActivationError::store_unavailable(message),
        TokenLedgerError::Storage { message } => ActivationError::storage(message),
        TokenLedgerError::InsufficientTokens => {
            ActivationError::storage("unexpected insufficient-token error")
        }
    }
}

struct DispatchJob {
    trigger: Trigger,
    caller: Caller,
    receipt: DebitReceipt,
    ledger: Arc<dyn TokenLedger>,
    executor: Arc<dyn TriggerExecutor>,
}

impl DispatchJob {
    async fn run(self) -> DispatchResolution {
        let Self {
            trigger,
            caller,
            receipt,
            ledger,
            executor,
        } = self;

        match executor.execute(&trigger).await {
            Ok(()) => {
                if let Err(err) = ledger.mark_action_success(receipt.action_id).await {
                    // The effect did fire; the action just stays counted as a failure.
                    error!(action_id = %receipt.action_id, error = %err, "failed to mark action successful");
                }
                info!(
                    trigger_id = %trigger.id,
                    action_id = %receipt.action_id,
                    "activation succeeded"
                );
                DispatchResolution::Succeeded
            }
            Err(dispatch_error) => {
                warn!(
                    trigger_id = %trigger.id,
                    action_id = %receipt.action_id,
                    user_id = %caller.user_id,
                    error = %dispatch_error,
                    "activation failed"
                );
                let refunded = if receipt.charged {
                    refund(ledger.as_ref(), &caller, receipt.action_id).await
                } else {
                    false
                };
                DispatchResolution::Failed {
                    error: dispatch_error,
                    refunded,
                }
            }
        }
    }
}

async fn refund(ledger: &dyn TokenLedger, caller: &Caller, action_id: ActionId) -> bool {
    match ledger.credit_one(&caller.user_id).await {
        Ok(()) => {
            info!(user_id = %caller.user_id, action_id = %action_id, "token refunded");
            true
        }
        Err(err) => {
            error!(user_id = %caller.user_id, action_id = %action_id, error = %err, "token refund failed");
            false
        }
    }
}

#[cfg(test)]
#[path = "activation_tests.rs"]
mod tests;
