//! Response models for the API client
//!
//! `RawResponse` is what a transport returns; `ResponseEnvelope` is what
//! collaborators receive, tagged with where the data came from.

use serde::Serialize;
use serde_json::Value;

/// Successful response as produced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body (`Null` for an empty body)
    pub data: Value,
}

impl RawResponse {
    /// Creates a new RawResponse
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// True for the 2xx success class, the only cacheable responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of an API call as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    /// HTTP status; 200 for cache-served responses
    pub status: u16,
    /// Response body
    pub data: Value,
    /// True when served from the cache without a network call
    pub from_cache: bool,
}

impl ResponseEnvelope {
    /// Wraps a live network response.
    pub fn live(response: RawResponse) -> Self {
        Self {
            status: response.status,
            data: response.data,
            from_cache: false,
        }
    }

    /// Synthesizes a response from a cached payload.
    pub fn cached(data: Value) -> Self {
        Self {
            status: 200,
            data,
            from_cache: true,
        }
    }

    /// Returns the named resource collection of a `{ name: [...] }` body.
    pub fn collection(&self, name: &str) -> Option<&Vec<Value>> {
        self.data.get(name).and_then(Value::as_array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_class() {
        assert!(RawResponse::new(200, Value::Null).is_success());
        assert!(RawResponse::new(204, Value::Null).is_success());
        assert!(!RawResponse::new(304, Value::Null).is_success());
        assert!(!RawResponse::new(500, Value::Null).is_success());
    }

    #[test]
    fn test_envelope_tags() {
        let live = ResponseEnvelope::live(RawResponse::new(201, json!({"id": 1})));
        assert_eq!(live.status, 201);
        assert!(!live.from_cache);

        let cached = ResponseEnvelope::cached(json!({"id": 1}));
        assert_eq!(cached.status, 200);
        assert!(cached.from_cache);
    }

    #[test]
    fn test_collection_lookup() {
        let envelope = ResponseEnvelope::cached(json!({"projects": [{"id": 1}, {"id": 2}]}));
        assert_eq!(envelope.collection("projects").map(Vec::len), Some(2));
        assert!(envelope.collection("revenue").is_none());
    }

    #[test]
    fn test_envelope_serialize() {
        let json = serde_json::to_string(&ResponseEnvelope::cached(json!([]))).unwrap();
        assert!(json.contains("\"from_cache\":true"));
    }
}
