//! Request models for the API client
//!
//! `ReadRequest` and `MutationRequest` are what collaborators build;
//! `HttpRequest` is what the transport receives.

use std::collections::BTreeMap;

use serde_json::Value;

use super::Category;

/// Query parameters of a read call, keyed by name.
pub type Params = BTreeMap<String, Value>;

/// HTTP method of an outgoing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the uppercase method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A read (fetch/list/get) call.
///
/// # Fields
/// - `category`: resource category, drives TTL and invalidation
/// - `endpoint`: path relative to the API base URL
/// - `params`: query parameters
/// - `use_cache`: `false` bypasses the cache in both directions
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    pub category: Category,
    pub endpoint: String,
    pub params: Params,
    pub use_cache: bool,
}

impl ReadRequest {
    /// Creates a cacheable read with no parameters.
    pub fn new(category: Category, endpoint: impl Into<String>) -> Self {
        Self {
            category,
            endpoint: endpoint.into(),
            params: Params::new(),
            use_cache: true,
        }
    }

    /// Adds a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replaces all query parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Opts this call out of caching (identity-sensitive reads).
    pub fn no_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Builds the wire request.
    pub fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            endpoint: self.endpoint.clone(),
            query: query_pairs(&self.params),
            body: None,
        }
    }
}

/// A create/update/delete call.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub category: Category,
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

impl MutationRequest {
    /// Creates a POST mutation.
    pub fn post(category: Category, endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(category, Method::Post, endpoint, Some(body))
    }

    /// Creates a PUT mutation.
    pub fn put(category: Category, endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(category, Method::Put, endpoint, Some(body))
    }

    /// Creates a PATCH mutation.
    pub fn patch(category: Category, endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(category, Method::Patch, endpoint, Some(body))
    }

    /// Creates a DELETE mutation.
    pub fn delete(category: Category, endpoint: impl Into<String>) -> Self {
        Self::new(category, Method::Delete, endpoint, None)
    }

    fn new(
        category: Category,
        method: Method,
        endpoint: impl Into<String>,
        body: Option<Value>,
    ) -> Self {
        Self {
            category,
            method,
            endpoint: endpoint.into(),
            body,
        }
    }

    /// Builds the wire request.
    pub fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            endpoint: self.endpoint.clone(),
            query: Vec::new(),
            body: self.body.clone(),
        }
    }
}

/// Request as handed to a [`Transport`](crate::transport::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Renders params as query pairs; strings go out unquoted, nulls are dropped.
fn query_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_request_defaults() {
        let req = ReadRequest::new(Category::Projects, "/projects");
        assert!(req.use_cache);
        assert!(req.params.is_empty());
        assert!(!req.clone().no_cache().use_cache);
    }

    #[test]
    fn test_read_request_query_rendering() {
        let req = ReadRequest::new(Category::Revenue, "/revenue")
            .param("status", "paid")
            .param("page", 2)
            .param("archived", Value::Null);

        let http = req.to_http();
        assert_eq!(http.method, Method::Get);
        assert_eq!(
            http.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "paid".to_string()),
            ]
        );
        assert!(http.body.is_none());
    }

    #[test]
    fn test_mutation_constructors() {
        let post = MutationRequest::post(Category::Billing, "/billing", json!({"amount": 10}));
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.to_http().body, Some(json!({"amount": 10})));

        let delete = MutationRequest::delete(Category::Billing, "/billing/3");
        assert_eq!(delete.method, Method::Delete);
        assert!(delete.to_http().body.is_none());
    }
}
