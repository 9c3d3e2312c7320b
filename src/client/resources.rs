//! Resource collaborators
//!
//! A `Resource` is the per-entity API surface (projects, revenue, ...). It
//! names its category on every call, so TTLs and invalidation never depend
//! on what the URL happens to contain.

use serde_json::Value;

use super::ApiClient;
use crate::error::TransportError;
use crate::models::{Category, MutationRequest, Params, ReadRequest, ResponseEnvelope};
use crate::transport::Transport;

/// CRUD helper for one resource collection.
#[derive(Debug)]
pub struct Resource<'a, T> {
    client: &'a ApiClient<T>,
    category: Category,
    base_path: String,
}

impl<'a, T: Transport> Resource<'a, T> {
    pub(super) fn new(
        client: &'a ApiClient<T>,
        category: Category,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            client,
            category,
            base_path: base_path.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.base_path, id)
    }

    /// `GET {base}` with query parameters.
    pub async fn list(&self, params: Params) -> Result<ResponseEnvelope, TransportError> {
        self.client
            .get(ReadRequest::new(self.category, self.base_path.clone()).with_params(params))
            .await
    }

    /// `GET {base}/{id}`
    pub async fn get(&self, id: &str) -> Result<ResponseEnvelope, TransportError> {
        self.client
            .get(ReadRequest::new(self.category, self.item_path(id)))
            .await
    }

    /// `POST {base}`
    pub async fn create(&self, body: Value) -> Result<ResponseEnvelope, TransportError> {
        self.client
            .mutate(MutationRequest::post(self.category, self.base_path.clone(), body))
            .await
    }

    /// `PUT {base}/{id}`
    pub async fn update(&self, id: &str, body: Value) -> Result<ResponseEnvelope, TransportError> {
        self.client
            .mutate(MutationRequest::put(self.category, self.item_path(id), body))
            .await
    }

    /// `DELETE {base}/{id}`
    pub async fn delete(&self, id: &str) -> Result<ResponseEnvelope, TransportError> {
        self.client
            .mutate(MutationRequest::delete(self.category, self.item_path(id)))
            .await
    }
}
