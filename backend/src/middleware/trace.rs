//! Per-request trace identifiers.
//!
//! [`trace_requests`] runs each request inside a fresh [`TraceId`] scope and a
//! `request` span, then stamps the id on the response. Errors built while the
//! request runs pick the id up automatically, and the activation dispatcher
//! carries it into the detached device task.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use tracing::{Instrument, info_span, warn};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware function; install with
/// `App::new().wrap(actix_web::middleware::from_fn(trace_requests))`.
///
/// ```
/// use actix_web::{App, middleware::from_fn};
/// use maze_dashboard::trace_requests;
///
/// let _app = App::new().wrap(from_fn(trace_requests));
/// ```
///
/// # Errors
///
/// Passes through errors from the wrapped service unchanged.
pub async fn trace_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let trace_id = TraceId::generate();
    let span = info_span!(
        "request",
        %trace_id,
        method = %req.method(),
        path = %req.path()
    );

    let mut response = TraceId::scope(trace_id, next.call(req))
        .instrument(span)
        .await?;

    match HeaderValue::try_from(trace_id.to_string()) {
        Ok(value) => {
            response
                .headers_mut()
                .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
        Err(error) => warn!(%error, %trace_id, "trace id is not a valid header value"),
    }
    Ok(response)
}
