//! Transport Module
//!
//! The seam between the caching client and the remote API.

mod http;

pub use http::ReqwestTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{HttpRequest, RawResponse};

/// Sends requests to the remote API.
///
/// Implementations return `Ok` only for success-class responses; anything
/// else is a [`TransportError`], which the cache passes through untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        (**self).send(request).await
    }
}
