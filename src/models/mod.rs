//! Request and Response models for the API client
//!
//! This module defines the resource categories and the request/response
//! shapes exchanged between collaborators, the client and the transport.

pub mod category;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use category::Category;
pub use requests::{HttpRequest, Method, MutationRequest, Params, ReadRequest};
pub use responses::{RawResponse, ResponseEnvelope};
