//! Response handling and transformation.
//!
//! # Responsibilities
//! - Convert the pipeline's response into the HTTP wire form
//! - Drop header names or values the HTTP layer cannot represent
//! - Map statuses outside the valid HTTP range to 500
//!
//! # Design Decisions
//! - Stage processes can emit arbitrary status numbers (they are exit
//!   codes in the degenerate case); only valid HTTP statuses go out

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response as HttpResponse;

use crate::pipeline::Response;

/// Convert a pipeline response into an HTTP response.
pub fn into_http_response(response: Response) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        tracing::debug!(status = response.status, "Non-HTTP status from pipeline, sending 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = HttpResponse::builder().status(status);
    for (name, value) in response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                builder = builder.header(name, value);
            }
            _ => {
                tracing::debug!(header = %name, "Dropping unrepresentable response header");
            }
        }
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| {
            HttpResponse::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .expect("static 500 response must build")
        })
}
