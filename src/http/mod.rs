//! HTTP transport for scenario steps
//!
//! The runner talks to the API through the [`Transport`] trait so that
//! scenarios can be driven by [`ApiClient`] against a live service or by a
//! scripted transport in tests.

mod client;
mod types;

pub use client::ApiClient;
pub use types::{decode_body, ApiRequest, ApiResponse, HttpMethod, StatusPolicy};

use async_trait::async_trait;

use crate::common::Result;

/// One request/response exchange with the API under test
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request` and return the response descriptor
    ///
    /// Under [`StatusPolicy::FailOnStatus`] a status outside 2xx/3xx is an
    /// error; under [`StatusPolicy::Surface`] it is returned as a response.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
