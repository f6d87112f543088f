//! Protocol-neutral response representation.

use std::collections::HashMap;

/// An HTTP-like response accumulated across pipeline phases.
///
/// A status of `0` means "not yet set"; the scheduler finalizes it to 200.
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Status code. Semantics follow HTTP; 0 reads as success-unset.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Whether this response counts as successful.
    ///
    /// Gatekeepers pass exactly when their output satisfies this test.
    pub fn is_ok(&self) -> bool {
        self.status == 0 || (200..300).contains(&self.status)
    }

    /// The fixed not-found response. Missing paths, permission-denied
    /// entries and non-executable mid-path files all collapse into this.
    pub fn not_found() -> Response {
        Response {
            status: 404,
            ..Default::default()
        }
    }

    /// The fixed internal-error response used on any execution fault.
    pub fn internal_error() -> Response {
        Response {
            status: 500,
            body: b"internal server error".to_vec(),
            ..Default::default()
        }
    }
}
