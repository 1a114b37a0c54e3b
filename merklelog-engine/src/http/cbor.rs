//! `application/cbor` request/response bodies (spec §6.1).
//!
//! Axum ships a `Json` extractor for `application/json` but nothing
//! equivalent for CBOR; `Cbor<T>` is the same idiom — extract by decoding
//! the body, respond by encoding it — built on `ciborium` instead of
//! `serde_json`.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::problem::problem_response;

/// Wraps a value carried as a CBOR request body or sent as one.
pub struct Cbor<T>(pub T);

impl<S, T> FromRequest<S> for Cbor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/cbor") {
            return Err(problem_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported-media-type",
                "Unsupported Media Type",
                Some(format!("expected application/cbor, got '{content_type}'")),
            ));
        }
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            problem_response(StatusCode::BAD_REQUEST, "invalid-request", "Invalid Request", Some(e.to_string()))
        })?;
        ciborium::from_reader(bytes.as_ref()).map(Cbor).map_err(|e| {
            problem_response(StatusCode::BAD_REQUEST, "invalid-request", "Invalid Request", Some(e.to_string()))
        })
    }
}

impl<T: Serialize> IntoResponse for Cbor<T> {
    fn into_response(self) -> Response {
        let mut buf = Vec::new();
        match ciborium::into_writer(&self.0, &mut buf) {
            Ok(()) => {
                let mut response = buf.into_response();
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/cbor"));
                response
            }
            Err(e) => problem_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Internal Server Error",
                Some(e.to_string()),
            ),
        }
    }
}
