//! Response assembly rules.
//!
//! Stage outputs fold into the in-progress request or response with
//! last-write-wins semantics. Header merges treat an empty value as a
//! removal, so a transformer can delete headers it never saw the value of.

use std::collections::HashMap;
use std::path::Path;

use crate::pipeline::overlay::ConfigOverlay;
use crate::pipeline::request::Request;
use crate::pipeline::response::Response;

/// Fold a passing request-transformer output into the request.
///
/// Headers merge (empty value removes), the body is replaced wholesale.
pub fn apply_request_stage(request: &mut Request, output: Response) {
    merge_headers(&mut request.headers, output.headers);
    request.body = output.body;
}

/// Fold a response-transformer output into the response.
///
/// Status and body are replaced, headers merge.
pub fn apply_response_stage(response: &mut Response, output: Response) {
    merge_headers(&mut response.headers, output.headers);
    response.body = output.body;
    response.status = output.status;
}

/// Key-by-key header merge; an empty incoming value removes the key.
pub fn merge_headers(target: &mut HashMap<String, String>, incoming: HashMap<String, String>) {
    for (name, value) in incoming {
        if value.is_empty() {
            target.remove(&name);
        } else {
            target.insert(name, value);
        }
    }
}

/// Fill in `Content-Type` from the directory config's MIME overrides when
/// no stage has claimed it.
pub fn apply_content_type(response: &mut Response, overlay: &ConfigOverlay, target: &Path) {
    if response.headers.contains_key("Content-Type") {
        return;
    }
    if let Some(content_type) = overlay.content_type_for(target) {
        response
            .headers
            .insert("Content-Type".to_string(), content_type.to_string());
    }
}

/// Final fixups before the response leaves the pipeline.
pub fn finalize(response: &mut Response) {
    if response.status == 0 {
        response.status = 200;
    }
}
