//! Protocol-neutral request representation.
//!
//! The listener front ends translate their wire format into this type before
//! handing it to the pipeline. One `Request` is owned by exactly one pipeline
//! execution; request transformers mutate it in place between phases.

use std::collections::HashMap;
use std::str::FromStr;

use url::Url;

/// An HTTP-like request, as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct Request {
    /// The request verb. Semantics follow HTTP; an empty string reads as GET.
    pub verb: String,
    /// The full requested URL.
    pub url: Url,
    /// Header name → value. A repeated header keeps its last value.
    pub headers: HashMap<String, String>,
    /// Query parameter name → value, parsed once from the URL.
    pub query: HashMap<String, String>,
    /// The request body, empty when the protocol carried none.
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request for the given URL, parsing its query string.
    pub fn new(verb: impl Into<String>, url: Url) -> Self {
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            verb: verb.into(),
            url,
            headers: HashMap::new(),
            query,
            body: Vec::new(),
        }
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new("GET", Url::from_str("http://localhost/").unwrap())
    }
}
