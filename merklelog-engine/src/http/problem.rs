//! RFC 9457 Problem Details responses (spec §6.1, §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use merklelog_queue::dto::ProblemDetails;

/// Build a CBOR-encoded Problem Details response.
pub(crate) fn problem_response(
    status: StatusCode,
    kind: &str,
    title: &str,
    detail: Option<String>,
) -> Response {
    let problem = ProblemDetails {
        kind: format!("https://forestrie.dev/problems/{kind}"),
        title: title.to_string(),
        status: status.as_u16(),
        detail,
    };
    let mut buf = Vec::new();
    if ciborium::into_writer(&problem, &mut buf).is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode problem details").into_response();
    }
    let mut response = (status, buf).into_response();
    response.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("application/cbor"),
    );
    response
}

/// Map a queue error kind (spec §7) onto its HTTP status and Problem
/// Details shape. The core `merklelog-queue::Error` stays transport-agnostic
/// (spec §7's propagation policy); this mapping lives only at the `http`
/// feature's boundary.
pub(crate) fn queue_error_response(err: merklelog_queue::Error) -> Response {
    use merklelog_queue::Error;
    match err {
        Error::InvalidRequest(detail) => {
            problem_response(StatusCode::BAD_REQUEST, "invalid-request", "Invalid Request", Some(detail))
        }
        Error::QueueFull { pending_count, max_pending, retry_after_seconds } => {
            let mut response = problem_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "queue-full",
                "Queue Full",
                Some(format!("{pending_count}/{max_pending} pending")),
            );
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
            response
        }
        Error::NotLeasedByCaller => {
            problem_response(StatusCode::CONFLICT, "not-leased-by-caller", "Not Leased By Caller", None)
        }
        Error::PollerLimitReached => {
            problem_response(StatusCode::TOO_MANY_REQUESTS, "poller-limit-reached", "Poller Limit Reached", None)
        }
        Error::Internal(detail) => {
            problem_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal Server Error", Some(detail))
        }
        // `Error` is `#[non_exhaustive]`; an unrecognized future variant is
        // itself an internal failure from this boundary's point of view.
        other => problem_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal Server Error",
            Some(other.to_string()),
        ),
    }
}
