//! Domain primitives, services and ports.
//!
//! Purpose: hold the activation state machine, the trigger model and the
//! statistics view independent of HTTP, SQL and device protocols. Adapters in
//! `inbound` and `outbound` implement or drive the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Trigger, TriggerKind, TriggerRegistry: what can be fired.
//! - ActivationService: charges a token, then fires the effect and refunds on failure.
//! - StatsService: read-only aggregates over the activation log.

pub mod action;
pub mod activation;
pub mod dispatch;
pub mod error;
pub mod ports;
pub mod stats;
pub mod trace_id;
pub mod trigger;
pub mod trigger_registry;
pub mod user;

pub use self::action::ActionId;
pub use self::activation::{
    ActivationError, ActivationOutcome, ActivationService, ActivationTicket, DispatchHandle,
    DispatchResolution,
};
pub use self::dispatch::ExecutorSet;
pub use self::error::{Error, ErrorCode};
pub use self::stats::{
    DEFAULT_STATS_WINDOW_MINUTES, DashboardStats, MinutePoint, StatsService, TriggerStats,
    UserStats, zero_fill_minutes,
};
pub use self::trace_id::TraceId;
pub use self::trigger::{
    LightState, LightTarget, LightTargetState, RgbColor, Trigger, TriggerId, TriggerKind,
    TriggerKindTag,
};
pub use self::trigger_registry::{TriggerRegistry, TriggerTable};
pub use self::user::{Caller, DEFAULT_TOKEN_ALLOTMENT, User, UserId, UserValidationError};

/// HTTP header name used to propagate trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";
