//! The one error type handlers and services return.
//!
//! An [`Error`] is a category plus a message the visitor may read. Adapters
//! turn it into a response; the domain never sees a status code.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::TraceId;

/// Failure category, serialised in snake case as the `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    /// No usable session, or a wrong admin secret.
    Unauthorized,
    /// Out of tokens, or the trigger is reserved for admins.
    Forbidden,
    NotFound,
    /// The store or a device could not be reached.
    ServiceUnavailable,
    InternalError,
}

/// ```
/// use maze_dashboard::domain::{Error, ErrorCode};
/// use serde_json::json;
///
/// let err = Error::forbidden("You are out of tokens!")
///     .with_details(json!({ "tokensRemaining": 0 }));
/// assert_eq!(err.code(), ErrorCode::Forbidden);
/// assert_eq!(err.to_string(), "You are out of tokens!");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

macro_rules! constructors {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            #[doc = concat!("An [`ErrorCode::", stringify!($code), "`] error.")]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )*
    };
}

impl Error {
    /// Picks up the trace id of the surrounding request, if there is one.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    constructors! {
        invalid_request => InvalidRequest,
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        not_found => NotFound,
        service_unavailable => ServiceUnavailable,
        internal => InternalError,
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Extra JSON for the client, such as the remaining balance.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}
