//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Enforce the body size limit before the pipeline runs
//! - Convert the wire request into the pipeline's protocol-neutral form
//!
//! # Design Decisions
//! - The pipeline owns its Request outright; nothing here is streamed,
//!   because stage processes consume the whole body on stdin anyway
//! - A request whose URL cannot be reconstructed still resolves against
//!   a root URL rather than failing the conversion

use axum::body::Body;
use axum::http::{HeaderValue, Request as HttpRequest, StatusCode};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::pipeline::Request;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID source for the `SetRequestIdLayer` middleware.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &HttpRequest<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Convert an HTTP request into the pipeline's request form, buffering
/// the body up to `max_body_size`.
pub async fn into_pipeline_request(
    request: HttpRequest<Body>,
    max_body_size: usize,
) -> Result<Request, StatusCode> {
    let (parts, body) = request.into_parts();

    let host = parts
        .headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = Url::parse(&format!("http://{host}{path_and_query}"))
        .unwrap_or_else(|_| Url::parse("http://localhost/").unwrap());

    let mut pipeline_request = Request::new(parts.method.to_string(), url);
    for (name, value) in &parts.headers {
        pipeline_request
            .headers
            .insert(name.to_string(), value.to_str().unwrap_or("").to_string());
    }

    let bytes = axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;
    pipeline_request.body = bytes.to_vec();

    Ok(pipeline_request)
}
